//! Bubble colours and pigment mixing
//!
//! Mixing goes through Mixbox's pigment latent space, so paints shift hue the
//! way real pigments do (red + yellow gives orange, blue + yellow gives green)
//! instead of washing out to grey like an RGB average.

use rand::Rng;

/// Fallback fill when a colour cannot be parsed
pub const FALLBACK_FILL: &str = "#6B7280";
/// Fallback stroke when a colour cannot be parsed
pub const FALLBACK_STROKE: &str = "#4B5563";

/// An 8-bit sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional, case-insensitive)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format as lowercase `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Fill, stroke and display name of a bubble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleColor {
    pub fill: String,
    pub stroke: String,
    /// Pigment name, or a `+`-joined composite after mixing
    pub name: String,
}

impl BubbleColor {
    pub fn new(fill: &str, stroke: &str, name: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            name: name.to_string(),
        }
    }

    /// Neutral grey used when mixing fails
    pub fn fallback() -> Self {
        Self::new(FALLBACK_FILL, FALLBACK_STROKE, "gray")
    }

    pub fn bomb() -> Self {
        Self::new("#1a1a1a", "#ff4444", "bomb")
    }

    pub fn clock() -> Self {
        Self::new("transparent", "transparent", "clock")
    }

    /// True when fill and stroke are the same colour (names are ignored)
    pub fn same_pigment(&self, other: &BubbleColor) -> bool {
        let same = |a: &str, b: &str| match (Rgb::from_hex(a), Rgb::from_hex(b)) {
            (Some(a), Some(b)) => a == b,
            _ => a.eq_ignore_ascii_case(b),
        };
        same(&self.fill, &other.fill) && same(&self.stroke, &other.stroke)
    }
}

/// Holds the primary palette and blends colours
#[derive(Debug, Clone)]
pub struct ColorMixer {
    palette: Vec<BubbleColor>,
}

impl Default for ColorMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorMixer {
    /// Red, yellow and blue in paint-like tones
    pub fn new() -> Self {
        Self {
            palette: vec![
                BubbleColor::new("#FF2702", "#CC1F02", "red"),
                BubbleColor::new("#FEEC00", "#CBBC00", "yellow"),
                BubbleColor::new("#002185", "#001A6B", "blue"),
            ],
        }
    }

    pub fn palette(&self) -> &[BubbleColor] {
        &self.palette
    }

    /// Uniform pick from the palette
    pub fn random_color<R: Rng + ?Sized>(&self, rng: &mut R) -> BubbleColor {
        let index = rng.random_range(0..self.palette.len());
        self.palette[index].clone()
    }

    /// 50/50 pigment blend of two colours
    ///
    /// Fill and stroke are mixed independently. The composite name joins the
    /// two input names in lexicographic order, so `mix(a, b) == mix(b, a)`.
    /// Any unparseable hex yields [`BubbleColor::fallback`].
    pub fn mix(&self, a: &BubbleColor, b: &BubbleColor) -> BubbleColor {
        let parsed = (
            Rgb::from_hex(&a.fill),
            Rgb::from_hex(&b.fill),
            Rgb::from_hex(&a.stroke),
            Rgb::from_hex(&b.stroke),
        );
        let (Some(fill_a), Some(fill_b), Some(stroke_a), Some(stroke_b)) = parsed else {
            log::warn!("Cannot mix {} with {}, using fallback grey", a.name, b.name);
            return BubbleColor::fallback();
        };

        let (first, second) = if a.name <= b.name {
            (&a.name, &b.name)
        } else {
            (&b.name, &a.name)
        };

        BubbleColor {
            fill: mix_pigments(fill_a, fill_b, 0.5).to_hex(),
            stroke: mix_pigments(stroke_a, stroke_b, 0.5).to_hex(),
            name: format!("{first}+{second}"),
        }
    }
}

/// Blend two colours as pigments, `t` is the share of `b` (0..=1)
pub fn mix_pigments(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let [r, g, b] = mixbox::lerp(&a.channels(), &b.channels(), t.clamp(0.0, 1.0));
    Rgb::new(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn named(mixer: &ColorMixer, name: &str) -> BubbleColor {
        mixer
            .palette()
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_hex("#FF2702"), Some(Rgb::new(255, 39, 2)));
        assert_eq!(Rgb::from_hex("ff2702"), Some(Rgb::new(255, 39, 2)));
        assert_eq!(Rgb::from_hex("#ff27"), None);
        assert_eq!(Rgb::from_hex("#+f2702"), None);
        assert_eq!(Rgb::from_hex("transparent"), None);
        assert_eq!(Rgb::new(255, 39, 2).to_hex(), "#ff2702");
    }

    #[test]
    fn test_palette_has_three_primaries() {
        let mixer = ColorMixer::new();
        let names: Vec<_> = mixer.palette().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["red", "yellow", "blue"]);
    }

    #[test]
    fn test_random_color_comes_from_palette() {
        let mixer = ColorMixer::new();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..50 {
            let color = mixer.random_color(&mut rng);
            assert!(mixer.palette().contains(&color));
        }
    }

    #[test]
    fn test_red_and_yellow_make_orange() {
        let mixer = ColorMixer::new();
        let orange = mixer.mix(&named(&mixer, "red"), &named(&mixer, "yellow"));
        let rgb = Rgb::from_hex(&orange.fill).unwrap();
        // Red stays dominant, green sits between the two inputs, blue stays low
        assert!(rgb.r > 200);
        assert!(rgb.g > 39 && rgb.g < 236);
        assert!(rgb.b < 20);
        assert_eq!(orange.name, "red+yellow");
    }

    #[test]
    fn test_blue_and_yellow_make_green() {
        let mixer = ColorMixer::new();
        let green = mixer.mix(&named(&mixer, "blue"), &named(&mixer, "yellow"));
        let rgb = Rgb::from_hex(&green.fill).unwrap();
        assert!(rgb.g > rgb.r);
        assert!(rgb.g > rgb.b);
    }

    #[test]
    fn test_mixing_same_pigment_is_identity() {
        let mixer = ColorMixer::new();
        let red = named(&mixer, "red");
        let mixed = mixer.mix(&red, &red);
        // The latent round trip may drift by a unit or two per channel
        let close = |a: &str, b: &str| {
            let (a, b) = (Rgb::from_hex(a).unwrap(), Rgb::from_hex(b).unwrap());
            a.channels()
                .iter()
                .zip(b.channels())
                .all(|(&x, y)| x.abs_diff(y) <= 2)
        };
        assert!(close(&mixed.fill, &red.fill));
        assert!(close(&mixed.stroke, &red.stroke));
        assert_eq!(mixed.name, "red+red");
    }

    #[test]
    fn test_unparseable_color_falls_back_to_grey() {
        let mixer = ColorMixer::new();
        let red = named(&mixer, "red");
        let mixed = mixer.mix(&red, &BubbleColor::clock());
        assert_eq!(mixed, BubbleColor::fallback());
    }

    #[test]
    fn test_same_pigment_ignores_name_and_case() {
        let a = BubbleColor::new("#FF2702", "#CC1F02", "red");
        let b = BubbleColor::new("#ff2702", "#cc1f02", "other");
        let c = BubbleColor::new("#FF2702", "#000000", "red");
        assert!(a.same_pigment(&b));
        assert!(!a.same_pigment(&c));
    }

    #[test]
    fn test_mix_endpoints_keep_inputs() {
        let a = Rgb::new(255, 39, 2);
        let b = Rgb::new(0, 33, 133);
        let at_a = mix_pigments(a, b, 0.0);
        let at_b = mix_pigments(a, b, 1.0);
        assert!(at_a.channels().iter().zip(a.channels()).all(|(&x, y)| x.abs_diff(y) <= 2));
        assert!(at_b.channels().iter().zip(b.channels()).all(|(&x, y)| x.abs_diff(y) <= 2));
    }

    proptest! {
        #[test]
        fn prop_mix_is_commutative(
            a in any::<(u8, u8, u8)>(),
            b in any::<(u8, u8, u8)>(),
        ) {
            let mixer = ColorMixer::new();
            let ca = BubbleColor::new(&Rgb::new(a.0, a.1, a.2).to_hex(), "#000000", "a");
            let cb = BubbleColor::new(&Rgb::new(b.0, b.1, b.2).to_hex(), "#ffffff", "b");
            prop_assert_eq!(mixer.mix(&ca, &cb), mixer.mix(&cb, &ca));
        }
    }
}
