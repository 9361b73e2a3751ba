//! Weight buckets for link strokes.

use petgraph::graph::EdgeIndex;

/// Keeps the largest weight inside the last bucket.
const MAX_PADDING: f64 = 0.001;

/// Links sharing one stroke width.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
	/// Lower bound with two decimals, or the missing-weight sentinel.
	pub label: String,
	/// Stroke width factor parsed back from `label`.
	pub width: f64,
	pub links: Vec<EdgeIndex>,
}

impl Bucket {
	fn new(label: String) -> Self {
		let width = label.parse().unwrap_or(0.0);
		Self {
			label,
			width,
			links: Vec::new(),
		}
	}
}

/// Buckets in draw order: the missing-weight bucket first, then ascending.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
	buckets: Vec<Bucket>,
}

impl Partition {
	pub fn buckets(&self) -> &[Bucket] {
		&self.buckets
	}

	pub fn len(&self) -> usize {
		self.buckets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buckets.is_empty()
	}

	/// The bucket for links without a weight.
	pub fn missing(&self) -> Option<&Bucket> {
		self.buckets.first()
	}

	pub fn bucket_of(&self, link: EdgeIndex) -> Option<&Bucket> {
		self.buckets.iter().find(|b| b.links.contains(&link))
	}
}

/// Split links into `bucket_count` equal-width weight ranges plus one
/// bucket, labelled `missing_width`, for links without a finite weight.
pub fn partition<I>(links: I, bucket_count: usize, missing_width: f64) -> Partition
where
	I: IntoIterator<Item = (EdgeIndex, Option<f64>)>,
{
	let links: Vec<_> = links
		.into_iter()
		.map(|(idx, w)| (idx, w.filter(|w| w.is_finite())))
		.collect();
	if links.is_empty() {
		return Partition::default();
	}

	let mut buckets = vec![Bucket::new(missing_width.to_string())];
	let (min, max) = links
		.iter()
		.filter_map(|(_, w)| *w)
		.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), w| {
			(lo.min(w), hi.max(w))
		});

	let count = bucket_count.max(1);
	let step = if min.is_finite() {
		(max + MAX_PADDING - min) / count as f64
	} else {
		0.0
	};
	if min.is_finite() {
		buckets.extend((0..count).map(|k| Bucket::new(format!("{:.2}", min + k as f64 * step))));
	}

	for (idx, weight) in links {
		let slot = match weight {
			Some(w) => 1 + (((w - min) / step).floor() as usize).min(count - 1),
			None => 0,
		};
		buckets[slot].links.push(idx);
	}
	Partition { buckets }
}
