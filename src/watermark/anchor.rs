/// Symbolic placement of a watermark on the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    LeftTop,
    LeftBottom,
    RightTop,
    RightBottom,
    Center,
    /// Tile the text across the whole image.
    Full,
}

impl Anchor {
    /// Resolve an anchor name, ignoring case and `-`/`_` separators.
    ///
    /// Both `left-top` and `top-left` orderings are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "lefttop" | "topleft" => Some(Anchor::LeftTop),
            "leftbottom" | "bottomleft" => Some(Anchor::LeftBottom),
            "righttop" | "topright" => Some(Anchor::RightTop),
            "rightbottom" | "bottomright" => Some(Anchor::RightBottom),
            "center" | "centre" => Some(Anchor::Center),
            "full" => Some(Anchor::Full),
            _ => None,
        }
    }

    /// Target point for a single stamp, using a 10% margin.
    ///
    /// `Full` has no single point and resolves like `LeftTop`.
    pub fn origin(self, width: u32, height: u32) -> (i32, i32) {
        let (w, h) = (width as i32, height as i32);
        let (dx, dy) = (w / 10, h / 10);

        match self {
            Anchor::LeftTop | Anchor::Full => (dx, dy),
            Anchor::LeftBottom => (dx, h - dy),
            Anchor::RightTop => (w - dx, dy),
            Anchor::RightBottom => (w - dx, h - dy),
            Anchor::Center => ((w - dx) / 2, (h - dy) / 2),
        }
    }
}
