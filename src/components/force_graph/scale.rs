//! Continuous color scales built from palette definitions.
//!
//! Every palette becomes a piecewise scale whose pieces interpolate in
//! cubehelix space with a gamma of 3 on lightness, so intermediate values
//! keep a clean hue instead of blending through grey.

use serde::{Deserialize, Serialize};

use super::error::{ForceGraphError, Result};

/// Fill used for nodes without a color value.
pub const MISSING_COLOR: &str = "rgba(255,255,255,0.6)";

const GAMMA: f64 = 3.0;

const A: f64 = -0.14861;
const B: f64 = 1.78277;
const C: f64 = -0.29227;
const D: f64 = -0.90649;
const E: f64 = 1.97294;
const ED: f64 = E * D;
const EB: f64 = E * B;
const BC_DA: f64 = B * C - D * A;

/// An sRGB color with 0..=255 channels, kept as floats until formatting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
	pub r: f64,
	pub g: f64,
	pub b: f64,
}

impl Rgb {
	/// Parse `#rgb` or `#rrggbb`.
	pub fn from_hex(hex: &str) -> Option<Self> {
		let digits = hex.strip_prefix('#')?;
		if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
			return None;
		}
		let expanded: String = match digits.len() {
			3 => digits.chars().flat_map(|c| [c, c]).collect(),
			6 => digits.to_owned(),
			_ => return None,
		};
		let v = u32::from_str_radix(&expanded, 16).ok()?;
		Some(Self {
			r: ((v >> 16) & 255) as f64,
			g: ((v >> 8) & 255) as f64,
			b: (v & 255) as f64,
		})
	}

	/// `rgba(r,g,b,alpha)` as used for strokes and label text.
	pub fn to_rgba(self, alpha: f64) -> String {
		let [r, g, b] = self.channels();
		format!("rgba({r},{g},{b},{alpha})")
	}

	/// CSS `rgb(r, g, b)` with channels rounded and clamped.
	pub fn to_css(self) -> String {
		let [r, g, b] = self.channels();
		format!("rgb({r}, {g}, {b})")
	}

	/// Rounded channels; NaN collapses to 0.
	pub fn channels(self) -> [u8; 3] {
		[self.r, self.g, self.b].map(|c| c.round().clamp(0.0, 255.0) as u8)
	}
}

#[derive(Clone, Copy, Debug)]
struct Cubehelix {
	h: f64,
	s: f64,
	l: f64,
}

impl From<Rgb> for Cubehelix {
	fn from(c: Rgb) -> Self {
		let (r, g, b) = (c.r / 255.0, c.g / 255.0, c.b / 255.0);
		let l = (BC_DA * b + ED * r - EB * g) / (BC_DA + ED - EB);
		let bl = b - l;
		let k = (E * (g - l) - C * bl) / D;
		let s = (k * k + bl * bl).sqrt() / (E * l * (1.0 - l));
		// zero or undefined saturation leaves the hue undefined
		let h = if s != 0.0 && !s.is_nan() {
			k.atan2(bl).to_degrees() - 120.0
		} else {
			f64::NAN
		};
		Self {
			h: if h < 0.0 { h + 360.0 } else { h },
			s,
			l,
		}
	}
}

impl From<Cubehelix> for Rgb {
	fn from(c: Cubehelix) -> Self {
		let h = if c.h.is_nan() {
			0.0
		} else {
			(c.h + 120.0).to_radians()
		};
		let a = if c.s.is_nan() {
			0.0
		} else {
			c.s * c.l * (1.0 - c.l)
		};
		let (cosh, sinh) = (h.cos(), h.sin());
		Rgb {
			r: 255.0 * (c.l + a * (A * cosh + B * sinh)),
			g: 255.0 * (c.l + a * (C * cosh + D * sinh)),
			b: 255.0 * (c.l + a * (E * cosh)),
		}
	}
}

/// One interpolated channel; undefined endpoints collapse to a constant.
#[derive(Clone, Copy, Debug)]
enum Channel {
	Linear(f64, f64),
	Constant(f64),
}

impl Channel {
	fn between(a: f64, b: f64) -> Self {
		let d = b - a;
		if d != 0.0 && !d.is_nan() {
			Self::Linear(a, d)
		} else {
			Self::Constant(if a.is_nan() { b } else { a })
		}
	}

	fn hue(a: f64, b: f64) -> Self {
		let d = b - a;
		if d != 0.0 && !d.is_nan() {
			let d = if !(-180.0..=180.0).contains(&d) {
				d - 360.0 * (d / 360.0).round()
			} else {
				d
			};
			Self::Linear(a, d)
		} else {
			Self::Constant(if a.is_nan() { b } else { a })
		}
	}

	fn at(self, t: f64) -> f64 {
		match self {
			Self::Linear(a, d) => a + t * d,
			Self::Constant(v) => v,
		}
	}
}

#[derive(Clone, Debug)]
struct Segment {
	h: Channel,
	s: Channel,
	l: Channel,
}

impl Segment {
	fn new(start: Rgb, end: Rgb) -> Self {
		let (a, b) = (Cubehelix::from(start), Cubehelix::from(end));
		Self {
			h: Channel::hue(a.h, b.h),
			s: Channel::between(a.s, b.s),
			l: Channel::between(a.l, b.l),
		}
	}

	fn at(&self, t: f64) -> Rgb {
		Cubehelix {
			h: self.h.at(t),
			s: self.s.at(t),
			l: self.l.at(t.powf(GAMMA)),
		}
		.into()
	}
}

/// Named palettes shipped with every configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaletteId {
	Linear2,
	Linear3,
	Dual,
	DualPos,
	DualNeg,
}

impl PaletteId {
	pub const ALL: [PaletteId; 5] = [
		PaletteId::Linear2,
		PaletteId::Linear3,
		PaletteId::Dual,
		PaletteId::DualPos,
		PaletteId::DualNeg,
	];

	fn index(self) -> usize {
		match self {
			PaletteId::Linear2 => 0,
			PaletteId::Linear3 => 1,
			PaletteId::Dual => 2,
			PaletteId::DualPos => 3,
			PaletteId::DualNeg => 4,
		}
	}
}

/// Sign side of a dual scheme, read from a node's `scheme` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
	Pos,
	Neg,
}

impl Side {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"Pos" | "pos" => Some(Side::Pos),
			"Neg" | "neg" => Some(Side::Neg),
			_ => None,
		}
	}
}

/// Node coloring scheme selected in the settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
	#[default]
	Linear2,
	Linear3,
	Dual,
}

impl Scheme {
	/// Palette that colors a node under this scheme.
	pub fn palette(self, side: Option<Side>) -> PaletteId {
		match (self, side) {
			(Scheme::Linear2, _) => PaletteId::Linear2,
			(Scheme::Linear3, _) => PaletteId::Linear3,
			(Scheme::Dual, Some(Side::Pos)) => PaletteId::DualPos,
			(Scheme::Dual, Some(Side::Neg)) => PaletteId::DualNeg,
			(Scheme::Dual, None) => PaletteId::Dual,
		}
	}

	/// Whether redefining `id` changes the colors of this scheme.
	pub fn uses(self, id: PaletteId) -> bool {
		matches!(
			(self, id),
			(Scheme::Linear2, PaletteId::Linear2)
				| (Scheme::Linear3, PaletteId::Linear3)
				| (
					Scheme::Dual,
					PaletteId::Dual | PaletteId::DualPos | PaletteId::DualNeg
				)
		)
	}
}

/// Breakpoints and their colors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
	pub domain: Vec<f64>,
	pub range: Vec<String>,
}

impl Palette {
	pub fn new(domain: &[f64], range: &[&str]) -> Self {
		Self {
			domain: domain.to_vec(),
			range: range.iter().map(|c| (*c).to_owned()).collect(),
		}
	}
}

/// One palette per [`PaletteId`].
#[derive(Clone, Debug, PartialEq)]
pub struct Palettes(Vec<Palette>);

impl Default for Palettes {
	fn default() -> Self {
		Self(vec![
			Palette::new(&[-1.0, 1.0], &["#FF0000", "#FFDEE2"]),
			Palette::new(&[-1.0, 0.0, 1.0], &["#4833FF", "#FFFFFF", "#FF0000"]),
			Palette::new(&[0.0, 0.05], &["#FF0000", "#FFDEE2"]),
			Palette::new(&[0.0, 0.05], &["#FF0000", "#FFDEE2"]),
			Palette::new(&[0.0, 0.05], &["#4833FF", "#CAD3FF"]),
		])
	}
}

impl Palettes {
	pub fn get(&self, id: PaletteId) -> &Palette {
		&self.0[id.index()]
	}

	pub fn set(&mut self, id: PaletteId, palette: Palette) {
		self.0[id.index()] = palette;
	}

	/// Apply a two-point domain to every palette; `linear3` gets the
	/// midpoint inserted as its middle breakpoint.
	pub fn override_domain(&mut self, [lo, hi]: [f64; 2]) {
		for id in PaletteId::ALL {
			let domain = match id {
				PaletteId::Linear3 => vec![lo, (lo + hi) / 2.0, hi],
				_ => vec![lo, hi],
			};
			self.0[id.index()].domain = domain;
		}
	}
}

/// Continuous color function for one palette.
#[derive(Clone, Debug)]
pub struct Scaler {
	domain: Vec<f64>,
	segments: Vec<Segment>,
}

impl Scaler {
	/// Domains must be monotonic; a descending domain is read in reverse.
	pub fn new(palette: &Palette) -> Result<Self> {
		if palette.domain.len() != palette.range.len() {
			return Err(ForceGraphError::Configuration(format!(
				"palette domain has {} breakpoints but range has {} colors",
				palette.domain.len(),
				palette.range.len()
			)));
		}
		if palette.domain.len() < 2 {
			return Err(ForceGraphError::Configuration(
				"palette needs at least two breakpoints".into(),
			));
		}
		let mut colors = palette
			.range
			.iter()
			.map(|hex| {
				Rgb::from_hex(hex).ok_or_else(|| {
					ForceGraphError::Configuration(format!("invalid palette color `{hex}`"))
				})
			})
			.collect::<Result<Vec<_>>>()?;
		let mut domain = palette.domain.clone();
		if domain[domain.len() - 1] < domain[0] {
			domain.reverse();
			colors.reverse();
		}
		let segments = colors.windows(2).map(|w| Segment::new(w[0], w[1])).collect();
		Ok(Self { domain, segments })
	}

	pub fn scale(&self, value: f64) -> Rgb {
		let last = self.domain.len() - 1;
		let i = self.domain[1..last].partition_point(|&d| d <= value);
		let (lo, hi) = (self.domain[i], self.domain[i + 1]);
		let t = if hi - lo != 0.0 {
			(value - lo) / (hi - lo)
		} else {
			0.5
		};
		self.segments[i].at(t)
	}

	pub fn color(&self, value: f64) -> String {
		self.scale(value).to_css()
	}
}

/// One scaler per palette, rebuilt whenever its palette changes.
#[derive(Clone, Debug)]
pub struct Scalers(Vec<Scaler>);

impl Scalers {
	pub fn build(palettes: &Palettes) -> Result<Self> {
		PaletteId::ALL
			.iter()
			.map(|&id| Scaler::new(palettes.get(id)))
			.collect::<Result<Vec<_>>>()
			.map(Self)
	}

	pub fn get(&self, id: PaletteId) -> &Scaler {
		&self.0[id.index()]
	}

	pub fn rebuild(&mut self, id: PaletteId, palette: &Palette) -> Result<()> {
		self.0[id.index()] = Scaler::new(palette)?;
		Ok(())
	}

	/// Final fill for a node value under `scheme`.
	pub fn resolve(&self, scheme: Scheme, value: Option<f64>, side: Option<Side>) -> String {
		match value {
			None => MISSING_COLOR.to_owned(),
			Some(v) => self.get(scheme.palette(side)).color(v),
		}
	}
}
