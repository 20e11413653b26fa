//! Property tag matching over raw save buffers
//!
//! The engine serializes a named field as:
//!
//! ```text
//! <PropertyName> 00  [filler]  <TypeName>Property 00  <header>  <payload>
//! ```
//!
//! The filler between the name terminator and the type name varies between
//! save versions, so it is matched as a bounded window rather than a fixed
//! offset. Both literals are located with memchr's memmem finder, so a scan
//! is linear in the buffer size no matter how many near-misses it contains.

use memchr::memmem;

/// Default number of filler bytes allowed between the name and type literals.
pub const DEFAULT_FILLER: usize = 5;

/// A named property of a given serialized type.
#[derive(Debug, Clone, Copy)]
pub struct PropertyTag {
    name: &'static str,
    type_name: &'static str,
    max_filler: usize,
}

/// One occurrence of a [`PropertyTag`] in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMatch {
    /// Offset of the first byte of the property name.
    pub offset: usize,
    /// Offset of the first byte after the `<TypeName>Property\0` terminator.
    pub payload: usize,
}

impl PropertyTag {
    /// Tag for `name` serialized as `<type_name>Property` (e.g. `"Int"`, `"Str"`).
    pub const fn new(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            type_name,
            max_filler: DEFAULT_FILLER,
        }
    }

    /// Widen or narrow the filler window.
    pub const fn with_filler(mut self, max_filler: usize) -> Self {
        self.max_filler = max_filler;
        self
    }

    fn name_marker(&self) -> Vec<u8> {
        let mut marker = Vec::with_capacity(self.name.len() + 1);
        marker.extend_from_slice(self.name.as_bytes());
        marker.push(0);
        marker
    }

    fn type_marker(&self) -> Vec<u8> {
        let mut marker = Vec::with_capacity(self.type_name.len() + 9);
        marker.extend_from_slice(self.type_name.as_bytes());
        marker.extend_from_slice(b"Property\0");
        marker
    }

    /// First occurrence of the tag in `data`.
    pub fn find(&self, data: &[u8]) -> Option<TagMatch> {
        self.find_iter(data).next()
    }

    /// Every occurrence of the tag in `data`, in buffer order.
    pub fn find_iter<'a>(&self, data: &'a [u8]) -> impl Iterator<Item = TagMatch> + 'a {
        let name_marker = self.name_marker();
        let type_marker = self.type_marker();
        let max_filler = self.max_filler;

        let type_finder = memmem::Finder::new(&type_marker).into_owned();
        let name_len = name_marker.len();
        let type_len = type_marker.len();

        memmem::find_iter(data, &name_marker)
            .into_owned()
            .filter_map(move |offset| {
                let after_name = offset + name_len;
                let window_end = data.len().min(after_name + max_filler + type_len);
                let window = data.get(after_name..window_end)?;
                let filler = type_finder.find(window)?;
                Some(TagMatch {
                    offset,
                    payload: after_name + filler + type_len,
                })
            })
    }

    /// First occurrence whose payload decodes through `decode`.
    ///
    /// Occurrences whose payload fails the decoder (truncated buffer, failed
    /// sanity check) are skipped rather than ending the search.
    pub fn find_map<T>(&self, data: &[u8], decode: impl Fn(&TagMatch) -> Option<T>) -> Option<T> {
        self.find_iter(data).find_map(|m| decode(&m))
    }
}

impl TagMatch {
    /// Single byte at `rel` bytes past the type terminator.
    pub fn u8_at(&self, data: &[u8], rel: usize) -> Option<u8> {
        data.get(self.payload.checked_add(rel)?).copied()
    }

    /// Little-endian `u32` at `rel` bytes past the type terminator.
    pub fn u32_le_at(&self, data: &[u8], rel: usize) -> Option<u32> {
        read_u32_le(data, self.payload.checked_add(rel)?)
    }

    /// Length-prefixed string whose 4-byte length sits `rel` bytes past the
    /// type terminator.
    ///
    /// The length counts the trailing NUL. Lengths outside `1..max_len` are
    /// rejected; invalid UTF-8 is replaced, never fatal.
    pub fn string_at(&self, data: &[u8], rel: usize, max_len: u32) -> Option<String> {
        let len_pos = self.payload.checked_add(rel)?;
        read_length_prefixed(data, len_pos, max_len)
    }
}

/// Little-endian `u32` at an absolute offset.
pub fn read_u32_le(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Length-prefixed, NUL-terminated string at an absolute offset.
pub fn read_length_prefixed(data: &[u8], len_pos: usize, max_len: u32) -> Option<String> {
    let len = read_u32_le(data, len_pos)?;
    if len == 0 || len >= max_len {
        return None;
    }
    let start = len_pos + 4;
    let end = start.checked_add(len as usize - 1)?;
    // A concurrently written file may end mid-string; take what is there.
    let bytes = data.get(start..end.min(data.len()))?;
    Some(lossy(bytes))
}

/// Best-effort UTF-8 decode.
pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// True if `needle` occurs anywhere in `data`.
#[inline]
pub fn contains(data: &[u8], needle: &[u8]) -> bool {
    memmem::find(data, needle).is_some()
}
