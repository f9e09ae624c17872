use super::model::{College, Dataset, ScatterPoint};

// ---------------------------------------------------------------------------
// Filter ranges: six inclusive bounds, one min/max pair per metric
// ---------------------------------------------------------------------------

/// Current slider values. All bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterRanges {
    pub ug_min: f64,
    pub ug_max: f64,
    pub earn_min: f64,
    pub earn_max: f64,
    pub cost_min: f64,
    pub cost_max: f64,
}

/// Identifies one of the six slider values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeBound {
    UgMin,
    UgMax,
    EarnMin,
    EarnMax,
    CostMin,
    CostMax,
}

impl RangeBound {
    pub const ALL: [RangeBound; 6] = [
        RangeBound::UgMin,
        RangeBound::UgMax,
        RangeBound::EarnMin,
        RangeBound::EarnMax,
        RangeBound::CostMin,
        RangeBound::CostMax,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RangeBound::UgMin => "Undergrad population (min)",
            RangeBound::UgMax => "Undergrad population (max)",
            RangeBound::EarnMin => "Mean earnings (min)",
            RangeBound::EarnMax => "Mean earnings (max)",
            RangeBound::CostMin => "Cost of attendance (min)",
            RangeBound::CostMax => "Cost of attendance (max)",
        }
    }
}

impl FilterRanges {
    pub fn get(&self, bound: RangeBound) -> f64 {
        match bound {
            RangeBound::UgMin => self.ug_min,
            RangeBound::UgMax => self.ug_max,
            RangeBound::EarnMin => self.earn_min,
            RangeBound::EarnMax => self.earn_max,
            RangeBound::CostMin => self.cost_min,
            RangeBound::CostMax => self.cost_max,
        }
    }

    pub fn set(&mut self, bound: RangeBound, value: f64) {
        let slot = match bound {
            RangeBound::UgMin => &mut self.ug_min,
            RangeBound::UgMax => &mut self.ug_max,
            RangeBound::EarnMin => &mut self.earn_min,
            RangeBound::EarnMax => &mut self.earn_max,
            RangeBound::CostMin => &mut self.cost_min,
            RangeBound::CostMax => &mut self.cost_max,
        };
        *slot = value;
    }

    /// Slider extent `(min, max)` for a bound: both sliders of a metric share one extent.
    pub fn extent(&self, bound: RangeBound) -> (f64, f64) {
        match bound {
            RangeBound::UgMin | RangeBound::UgMax => (self.ug_min, self.ug_max),
            RangeBound::EarnMin | RangeBound::EarnMax => (self.earn_min, self.earn_max),
            RangeBound::CostMin | RangeBound::CostMax => (self.cost_min, self.cost_max),
        }
    }

    /// Whether a record lies inside all three ranges.
    ///
    /// `undergrad_population` is an integer, so it is always a defined number.
    pub fn admits(&self, college: &College) -> bool {
        let ug = college.undergrad_population as f64;
        ug >= self.ug_min
            && ug <= self.ug_max
            && college.mean_earnings_10yr >= self.earn_min
            && college.mean_earnings_10yr <= self.earn_max
            && college.cost_of_attendance >= self.cost_min
            && college.cost_of_attendance <= self.cost_max
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Return the records that pass `ranges`, in input order.
///
/// The input is not touched; filtering an already-filtered subset with the same
/// ranges returns the same subset.
pub fn apply_filter(colleges: &[College], ranges: &FilterRanges) -> Vec<College> {
    colleges
        .iter()
        .filter(|c| ranges.admits(c))
        .cloned()
        .collect()
}

/// Project records onto the scatter view.
///
/// Only records with positive earnings and unemployment are kept: a zero earnings
/// value is the "unknown" sentinel, not an observation.
pub fn scatter_points(colleges: &[College]) -> Vec<ScatterPoint> {
    colleges
        .iter()
        .filter(|c| c.mean_earnings_10yr > 0.0 && c.unemployment_rate > 0.0)
        .map(|c| ScatterPoint {
            earnings: c.mean_earnings_10yr,
            unemployment: c.unemployment_rate,
            name: c.name.clone(),
        })
        .collect()
}

/// Largest earnings and unemployment values in a scatter projection, used as the
/// fixed axis extents. `(0, 0)` for an empty projection.
pub fn scatter_extent(points: &[ScatterPoint]) -> (f64, f64) {
    points.iter().fold((0.0_f64, 0.0_f64), |(x, y), p| {
        (x.max(p.earnings), y.max(p.unemployment))
    })
}

// ---------------------------------------------------------------------------
// Bound derivation
// ---------------------------------------------------------------------------

/// Pointwise min/max of each filtered metric over the dataset.
///
/// Returns `None` for an empty dataset.
pub fn derive_bounds(dataset: &Dataset) -> Option<FilterRanges> {
    let mut iter = dataset.colleges.iter();
    let first = iter.next()?;

    let ug = first.undergrad_population as f64;
    let seed = FilterRanges {
        ug_min: ug,
        ug_max: ug,
        earn_min: first.mean_earnings_10yr,
        earn_max: first.mean_earnings_10yr,
        cost_min: first.cost_of_attendance,
        cost_max: first.cost_of_attendance,
    };

    Some(iter.fold(seed, |b, c| {
        let ug = c.undergrad_population as f64;
        FilterRanges {
            ug_min: b.ug_min.min(ug),
            ug_max: b.ug_max.max(ug),
            earn_min: b.earn_min.min(c.mean_earnings_10yr),
            earn_max: b.earn_max.max(c.mean_earnings_10yr),
            cost_min: b.cost_min.min(c.cost_of_attendance),
            cost_max: b.cost_max.max(c.cost_of_attendance),
        }
    }))
}
