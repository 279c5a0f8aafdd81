//! Pairwise frame cost strategies.

use crate::recording::Frame;

/// Everything a cost strategy may inspect for one frame pair.
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    /// Reference frame index.
    pub reference_index: usize,
    /// Query frame index.
    pub query_index: usize,
    /// Reference frame timestamp, if the recording carries timestamps.
    pub reference_time: Option<f64>,
    /// Query frame timestamp, if the recording carries timestamps.
    pub query_time: Option<f64>,
    /// The reference frame.
    pub reference_frame: &'a Frame,
    /// The query frame.
    pub query_frame: &'a Frame,
}

/// Pairwise cost strategy: a closed set of variants rather than open-ended
/// subclassing. Spectral variants match frames on unit-mass bins.
#[derive(Debug, Clone, Copy)]
pub enum CostFunction {
    /// `|TIC_ref - TIC_query|`. Minimizing.
    AbsoluteDifference,
    /// Spectral dot product over shared unit-mass bins. Maximizing.
    DotProduct,
    /// Pearson correlation over the union of unit-mass bins. Maximizing.
    Correlation,
    /// A caller-supplied strategy.
    Custom {
        /// Evaluate the cost or similarity of one frame pair.
        eval: fn(&CostContext<'_>) -> f64,
        /// Whether smaller values are better.
        minimizes: bool,
    },
}

impl CostFunction {
    /// Return true if smaller values are better (cost), false if larger
    /// values are better (similarity).
    #[must_use]
    pub fn minimizes(&self) -> bool {
        match self {
            Self::AbsoluteDifference => true,
            Self::DotProduct | Self::Correlation => false,
            Self::Custom { minimizes, .. } => *minimizes,
        }
    }

    /// Evaluate the strategy on one frame pair.
    #[must_use]
    pub fn evaluate(&self, ctx: &CostContext<'_>) -> f64 {
        match self {
            Self::AbsoluteDifference => {
                (ctx.reference_frame.total_intensity() - ctx.query_frame.total_intensity()).abs()
            }
            Self::DotProduct => dot_product(ctx.reference_frame, ctx.query_frame),
            Self::Correlation => correlation(ctx.reference_frame, ctx.query_frame),
            Self::Custom { eval, .. } => eval(ctx),
        }
    }

    /// The fill value marking unreachable cells: `+inf` when minimizing,
    /// `-inf` when maximizing.
    pub(crate) fn unreachable_fill(&self) -> f64 {
        if self.minimizes() {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    }
}

/// Dot product over shared unit-mass bins of two frames.
fn dot_product(a: &Frame, b: &Frame) -> f64 {
    let bins_a = a.unit_mass_bins();
    let bins_b = b.unit_mass_bins();
    let mut sum = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < bins_a.len() && j < bins_b.len() {
        match bins_a[i].0.cmp(&bins_b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += bins_a[i].1 * bins_b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Pearson correlation over the union of unit-mass bins, missing bins
/// counted as zero intensity. Zero variance on either side yields 0.0.
fn correlation(a: &Frame, b: &Frame) -> f64 {
    let bins_a = a.unit_mass_bins();
    let bins_b = b.unit_mass_bins();

    let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(bins_a.len() + bins_b.len());
    let (mut i, mut j) = (0, 0);
    while i < bins_a.len() || j < bins_b.len() {
        match (bins_a.get(i), bins_b.get(j)) {
            (Some(&(ba, xa)), Some(&(bb, xb))) => match ba.cmp(&bb) {
                std::cmp::Ordering::Less => {
                    pairs.push((xa, 0.0));
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    pairs.push((0.0, xb));
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    pairs.push((xa, xb));
                    i += 1;
                    j += 1;
                }
            },
            (Some(&(_, xa)), None) => {
                pairs.push((xa, 0.0));
                i += 1;
            }
            (None, Some(&(_, xb))) => {
                pairs.push((0.0, xb));
                j += 1;
            }
            (None, None) => break,
        }
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for &(xa, xb) in &pairs {
        let da = xa - mean_a;
        let db = xb - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    cov / (var_a * var_b).sqrt()
}
