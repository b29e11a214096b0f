//! Marker palettes and the growth policy that stretches them over the signal count.

/// Default marker symbols, one per signal until the list wraps.
pub const DEFAULT_SYMBOLS: [&str; 7] = [
    "triangle-down",
    "triangle-up",
    "circle",
    "square",
    "diamond",
    "cross",
    "x",
];

/// Default marker colors, paired with `DEFAULT_SYMBOLS` by position.
pub const DEFAULT_COLORS: [&str; 7] = [
    "green", "red", "blue", "purple", "orange", "teal", "magenta",
];

/// Append the list to itself until it holds at least `required` entries.
///
/// The result may overshoot (3 entries become 6 for a requirement of 5).
/// An empty list is returned unchanged.
pub fn extend_by_doubling(mut items: Vec<String>, required: usize) -> Vec<String> {
    if items.is_empty() {
        return items;
    }
    while items.len() < required {
        items.extend_from_within(..);
    }
    items
}

/// Resolved marker styles for a chart with `count` signals.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerPalette {
    symbols: Vec<String>,
    colors: Vec<String>,
}

impl MarkerPalette {
    /// Use the supplied lists, falling back to the defaults when a list is unset or empty.
    pub fn resolve(
        symbols: Option<&[String]>,
        colors: Option<&[String]>,
        count: usize,
    ) -> Self {
        fn pick(supplied: Option<&[String]>, defaults: &[&str]) -> Vec<String> {
            match supplied {
                Some(list) if !list.is_empty() => list.to_vec(),
                _ => defaults.iter().map(|s| s.to_string()).collect(),
            }
        }

        Self {
            symbols: extend_by_doubling(pick(symbols, &DEFAULT_SYMBOLS), count),
            colors: extend_by_doubling(pick(colors, &DEFAULT_COLORS), count),
        }
    }

    /// Symbol for signal `i`, wrapping around the list.
    pub fn symbol(&self, i: usize) -> &str {
        &self.symbols[i % self.symbols.len()]
    }

    /// Color for signal `i`, wrapping around the list.
    pub fn color(&self, i: usize) -> &str {
        &self.colors[i % self.colors.len()]
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn doubling_overshoots() {
        let grown = extend_by_doubling(strings(&["a", "b", "c"]), 5);
        assert_eq!(grown, strings(&["a", "b", "c", "a", "b", "c"]));
    }

    #[test]
    fn doubling_leaves_long_lists_alone() {
        let grown = extend_by_doubling(strings(&["a", "b"]), 2);
        assert_eq!(grown, strings(&["a", "b"]));
        assert!(extend_by_doubling(Vec::new(), 4).is_empty());
    }

    #[test]
    fn defaults_when_unset() {
        let palette = MarkerPalette::resolve(None, None, 2);
        assert_eq!(palette.symbol(0), "triangle-down");
        assert_eq!(palette.color(0), "green");
        assert_eq!(palette.symbol(1), "triangle-up");
        assert_eq!(palette.color(1), "red");
        assert_eq!(palette.symbols().len(), 7);
    }

    #[test]
    fn defaults_wrap_past_seven_signals() {
        let palette = MarkerPalette::resolve(None, None, 9);
        assert_eq!(palette.symbols().len(), 14);
        assert_eq!(palette.symbol(7), "triangle-down");
        assert_eq!(palette.color(8), "red");
    }

    #[test]
    fn short_lists_cycle_deterministically() {
        let symbols = strings(&["circle", "square"]);
        let colors = strings(&["black", "gray"]);
        let palette = MarkerPalette::resolve(Some(symbols.as_slice()), Some(colors.as_slice()), 5);

        assert_eq!(palette.symbols().len(), 8);
        let assigned: Vec<&str> = (0..5).map(|i| palette.symbol(i)).collect();
        assert_eq!(assigned, ["circle", "square", "circle", "square", "circle"]);
        assert_eq!(palette.color(2), "black");
        assert_eq!(palette.color(3), "gray");
    }

    #[test]
    fn empty_list_falls_back_to_defaults() {
        let palette = MarkerPalette::resolve(Some(&[][..]), None, 3);
        assert_eq!(palette.symbol(2), "circle");
    }

    #[test]
    fn caller_lists_are_not_modified() {
        let symbols = strings(&["circle"]);
        let _ = MarkerPalette::resolve(Some(symbols.as_slice()), None, 4);
        assert_eq!(symbols.len(), 1);
    }
}
