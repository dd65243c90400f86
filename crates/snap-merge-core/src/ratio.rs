use std::fmt;
use std::str::FromStr;

/// Allowed width:height ratios, in lowest terms.
pub const DEFAULT_ALLOWED_RATIOS: [&str; 7] = ["1:1", "2:3", "3:2", "4:3", "3:4", "9:16", "16:9"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Reduce `width:height` by their greatest common divisor.
    ///
    /// A zero side yields `1:0`, `0:1` or `0:0`, none of which can ever be allowed.
    pub fn of(width: u32, height: u32) -> Self {
        let divisor = gcd(width, height);
        if divisor == 0 {
            return Self { width: 0, height: 0 };
        }
        Self {
            width: width / divisor,
            height: height / divisor,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("ratio '{}' is not of the form W:H", s))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("ratio '{}' has a non-numeric width", s))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("ratio '{}' has a non-numeric height", s))?;
        if width == 0 || height == 0 {
            return Err(format!("ratio '{}' has a zero side", s));
        }
        // "32:18" and "16:9" name the same ratio
        Ok(AspectRatio::of(width, height))
    }
}

pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Parse a list of `W:H` strings into reduced ratios.
pub fn parse_ratios(ratios: &[String]) -> Result<Vec<AspectRatio>, String> {
    ratios.iter().map(|r| r.parse()).collect()
}
