//! Anchor-relative field association
//!
//! Fields such as the uploading server or map are not guaranteed to sit next
//! to the character that owns them. Resolution searches outward from the
//! character's anchor in three tiers and takes the first hit:
//!
//! 1. forward from the anchor, clamped by a hard upper bound (the next
//!    character's anchor) so one character can't take another's fields
//! 2. backward from the anchor, closest match first
//! 3. anywhere in the buffer

use regex::bytes::Regex;

/// Default forward and backward search distance in bytes.
pub const DEFAULT_WINDOW: usize = 200_000;

/// Which tier produced a [`Resolved`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Forward,
    Backward,
    Global,
}

/// Capture group 1 of a resolved match, tagged with the tier that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'h> {
    pub value: &'h [u8],
    pub tier: Tier,
}

#[derive(Debug, Clone, Copy)]
pub struct AnchorWindow {
    pub forward: usize,
    pub backward: usize,
}

impl Default for AnchorWindow {
    fn default() -> Self {
        Self {
            forward: DEFAULT_WINDOW,
            backward: DEFAULT_WINDOW,
        }
    }
}

impl AnchorWindow {
    pub fn new(forward: usize, backward: usize) -> Self {
        Self { forward, backward }
    }

    /// Resolve capture group 1 of `pattern` relative to `anchor`.
    ///
    /// `upper_bound` clamps the forward tier only; the backward and global
    /// tiers may return bytes owned by a neighbouring entity.
    pub fn nearest_match<'h>(
        &self,
        pattern: &Regex,
        data: &'h [u8],
        anchor: usize,
        upper_bound: usize,
    ) -> Option<Resolved<'h>> {
        let anchor = anchor.min(data.len());

        let end = data
            .len()
            .min(anchor.saturating_add(self.forward))
            .min(upper_bound);
        if end > anchor {
            if let Some(value) = group1(pattern, &data[anchor..end]) {
                return Some(Resolved {
                    value,
                    tier: Tier::Forward,
                });
            }
        }

        let start = anchor.saturating_sub(self.backward);
        if let Some(value) = pattern
            .captures_iter(&data[start..anchor])
            .filter_map(|c| c.get(1))
            .last()
        {
            return Some(Resolved {
                value: value.as_bytes(),
                tier: Tier::Backward,
            });
        }

        group1(pattern, data).map(|value| Resolved {
            value,
            tier: Tier::Global,
        })
    }
}

/// Capture group 1 of the first match of `pattern` in `haystack`.
pub(crate) fn group1<'h>(pattern: &Regex, haystack: &'h [u8]) -> Option<&'h [u8]> {
    pattern
        .captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Regex {
        Regex::new(r"(?s-u)SRV=([A-Za-z0-9]{1,32});").unwrap()
    }

    fn buffer(len: usize, fields: &[(usize, &str)]) -> Vec<u8> {
        let mut data = vec![b'.'; len];
        for (at, value) in fields {
            let text = format!("SRV={};", value);
            data[*at..*at + text.len()].copy_from_slice(text.as_bytes());
        }
        data
    }

    #[test]
    fn test_forward_wins() {
        let data = buffer(1000, &[(100, "Before"), (600, "After")]);
        let window = AnchorWindow::new(500, 500);
        let hit = window.nearest_match(&field(), &data, 500, data.len()).unwrap();
        assert_eq!(hit.value, b"After");
        assert_eq!(hit.tier, Tier::Forward);
    }

    #[test]
    fn test_upper_bound_clamps_forward() {
        let data = buffer(1000, &[(100, "Before"), (600, "Neighbour")]);
        let window = AnchorWindow::new(500, 500);
        let hit = window.nearest_match(&field(), &data, 500, 600).unwrap();
        assert_eq!(hit.value, b"Before");
        assert_eq!(hit.tier, Tier::Backward);
    }

    #[test]
    fn test_backward_beats_global() {
        // "Far" is outside the backward window, "Near" is inside it and
        // beyond the forward window of an earlier anchor.
        let data = buffer(5000, &[(10, "Far"), (3000, "Near")]);
        let window = AnchorWindow::new(100, 1000);

        let early = window.nearest_match(&field(), &data, 2000, data.len()).unwrap();
        assert_eq!(early.value, b"Far");
        assert_eq!(early.tier, Tier::Global);

        let late = window.nearest_match(&field(), &data, 3500, data.len()).unwrap();
        assert_eq!(late.value, b"Near");
        assert_eq!(late.tier, Tier::Backward);
    }

    #[test]
    fn test_backward_takes_closest() {
        let data = buffer(1000, &[(100, "Old"), (300, "Recent")]);
        let window = AnchorWindow::default();
        let hit = window.nearest_match(&field(), &data, 800, data.len()).unwrap();
        assert_eq!(hit.value, b"Recent");
    }

    #[test]
    fn test_no_match() {
        let data = buffer(100, &[]);
        assert!(AnchorWindow::default()
            .nearest_match(&field(), &data, 50, 100)
            .is_none());
    }

    #[test]
    fn test_anchor_past_end_is_clamped() {
        let data = buffer(100, &[(10, "Only")]);
        let hit = AnchorWindow::default()
            .nearest_match(&field(), &data, 10_000, usize::MAX)
            .unwrap();
        assert_eq!(hit.value, b"Only");
    }
}
