//! Significance tests of PnL differences across sentiment buckets.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal};

use super::aggregate::{group_by, net_pnls};
use super::sentiment::Sentiment;
use super::trade::TradeRecord;

pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: Option<usize>,
}

impl TestResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// One-way ANOVA F test. Needs two non-empty groups and within-group variance.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Option<TestResult> {
    if groups.len() < 2 || groups.iter().any(|g| g.is_empty()) {
        return None;
    }
    let k = groups.len();
    let n: usize = groups.iter().map(Vec::len).sum();
    if n <= k {
        return None;
    }
    let grand = groups.iter().flatten().sum::<f64>() / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in groups {
        let m = g.iter().sum::<f64>() / g.len() as f64;
        ss_between += g.len() as f64 * (m - grand).powi(2);
        ss_within += g.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    }
    if ss_within == 0.0 {
        return None;
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let f = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).ok()?;
    Some(TestResult {
        statistic: f,
        p_value: dist.sf(f),
        dof: Some(k - 1),
    })
}

/// Kruskal-Wallis H test with tie correction.
pub fn kruskal_wallis(groups: &[Vec<f64>]) -> Option<TestResult> {
    if groups.len() < 2 || groups.iter().any(|g| g.is_empty()) {
        return None;
    }
    let pooled: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = pooled.len() as f64;
    let (ranks, tie_term) = average_ranks(&pooled);

    let mut offset = 0;
    let mut h = 0.0;
    for g in groups {
        let r: f64 = ranks[offset..offset + g.len()].iter().sum();
        h += r * r / g.len() as f64;
        offset += g.len();
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let correction = 1.0 - tie_term / (n.powi(3) - n);
    if correction <= 0.0 {
        return None;
    }
    h /= correction;

    let dof = groups.len() - 1;
    let dist = ChiSquared::new(dof as f64).ok()?;
    Some(TestResult {
        statistic: h,
        p_value: dist.sf(h),
        dof: Some(dof),
    })
}

/// Chi-square test of independence on a table of counts.
///
/// Rows or columns summing to zero are dropped first. Applies the Yates
/// continuity correction when the table has one degree of freedom.
pub fn chi_square_independence(table: &[Vec<f64>]) -> Option<TestResult> {
    let cols = table.first()?.len();
    let col_totals: Vec<f64> = (0..cols)
        .map(|j| table.iter().map(|row| row[j]).sum())
        .collect();
    let keep_cols: Vec<usize> = (0..cols).filter(|&j| col_totals[j] > 0.0).collect();
    let observed: Vec<Vec<f64>> = table
        .iter()
        .filter(|row| row.iter().sum::<f64>() > 0.0)
        .map(|row| keep_cols.iter().map(|&j| row[j]).collect())
        .collect();

    let r = observed.len();
    let c = keep_cols.len();
    if r < 2 || c < 2 {
        return None;
    }
    let dof = (r - 1) * (c - 1);

    let row_totals: Vec<f64> = observed.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..c)
        .map(|j| observed.iter().map(|row| row[j]).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();

    let mut chi2 = 0.0;
    for (i, row) in observed.iter().enumerate() {
        for (j, &o) in row.iter().enumerate() {
            let e = row_totals[i] * col_totals[j] / total;
            let o = if dof == 1 {
                let diff = e - o;
                o + diff.signum() * diff.abs().min(0.5)
            } else {
                o
            };
            chi2 += (o - e).powi(2) / e;
        }
    }

    let dist = ChiSquared::new(dof as f64).ok()?;
    Some(TestResult {
        statistic: chi2,
        p_value: dist.sf(chi2),
        dof: Some(dof),
    })
}

/// Two-sided Mann-Whitney U test, normal approximation with tie and continuity correction.
///
/// The approximation is used at every sample size. Small tie-free samples do not
/// switch to the exact U distribution, so 3 vs 3 fully separated gives p ~ 0.081
/// where an exact test gives 0.1.
///
/// The reported statistic is U for the first sample.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Option<TestResult> {
    if x.is_empty() || y.is_empty() {
        return None;
    }
    let n1 = x.len() as f64;
    let n2 = y.len() as f64;
    let pooled: Vec<f64> = x.iter().chain(y.iter()).copied().collect();
    let n = pooled.len() as f64;
    let (ranks, tie_term) = average_ranks(&pooled);

    let r1: f64 = ranks[..x.len()].iter().sum();
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;

    let mu = n1 * n2 / 2.0;
    let sigma = (n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
    if !sigma.is_finite() || sigma == 0.0 {
        return None;
    }
    let z = (u1.max(u2) - mu - 0.5) / sigma;
    let normal = Normal::new(0.0, 1.0).ok()?;
    Some(TestResult {
        statistic: u1,
        p_value: (2.0 * normal.sf(z)).min(1.0),
        dof: None,
    })
}

/// Average ranks (1-based) and the tie term `sum(t^3 - t)` over tie groups.
fn average_ranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        let t = (j - i) as f64;
        tie_term += t.powi(3) - t;
        i = j;
    }
    (ranks, tie_term)
}

/// Sentiment by (losing, winning) trade counts for every bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    pub rows: Vec<(Sentiment, usize, usize)>,
}

impl ContingencyTable {
    /// Buckets with at least one trade, in bucket order.
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let mut counts = [(0usize, 0usize); 5];
        for t in trades {
            let cell = &mut counts[t.sentiment.index()];
            if t.is_profitable {
                cell.1 += 1;
            } else {
                cell.0 += 1;
            }
        }
        let rows = Sentiment::ALL
            .iter()
            .filter(|s| counts[s.index()] != (0, 0))
            .map(|s| (*s, counts[s.index()].0, counts[s.index()].1))
            .collect();
        Self { rows }
    }

    pub fn as_matrix(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|(_, loss, win)| vec![*loss as f64, *win as f64])
            .collect()
    }
}

/// The full battery of tests run on the analytics page.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentTests {
    pub groups: Vec<(Sentiment, usize)>,
    pub anova: Option<TestResult>,
    pub kruskal: Option<TestResult>,
    pub chi_square: Option<TestResult>,
    pub contingency: ContingencyTable,
    pub fear_vs_greed: Option<TestResult>,
}

impl SentimentTests {
    pub fn compute(trades: &[&TradeRecord]) -> Self {
        let grouped = group_by(trades, |t| Some(t.sentiment));
        let groups: Vec<(Sentiment, Vec<f64>)> = grouped
            .iter()
            .map(|(s, g)| (*s, net_pnls(g)))
            .filter(|(_, pnl)| !pnl.is_empty())
            .collect();
        let samples: Vec<Vec<f64>> = groups.iter().map(|(_, p)| p.clone()).collect();

        let contingency = ContingencyTable::compute(trades);
        let chi_square = chi_square_independence(&contingency.as_matrix());

        let sample_of = |s: Sentiment| groups.iter().find(|(g, _)| *g == s).map(|(_, p)| p);
        let fear_vs_greed = match (
            sample_of(Sentiment::ExtremeFear),
            sample_of(Sentiment::ExtremeGreed),
        ) {
            (Some(fear), Some(greed)) => mann_whitney_u(fear, greed),
            _ => None,
        };

        Self {
            groups: groups.iter().map(|(s, p)| (*s, p.len())).collect(),
            anova: one_way_anova(&samples),
            kruskal: kruskal_wallis(&samples),
            chi_square,
            contingency,
            fear_vs_greed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_groups() -> Vec<Vec<f64>> {
        vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
    }

    #[test]
    fn anova_matches_hand_computation() {
        let r = one_way_anova(&two_groups()).unwrap();
        assert_relative_eq!(r.statistic, 13.5, epsilon = 1e-12);
        assert!(r.p_value > 0.01 && r.p_value < 0.03);
        assert_eq!(r.dof, Some(1));
        assert!(r.is_significant(0.05));
    }

    #[test]
    fn anova_degenerate_inputs() {
        assert!(one_way_anova(&[vec![1.0, 2.0]]).is_none());
        assert!(one_way_anova(&[vec![1.0, 1.0], vec![2.0, 2.0]]).is_none());
        assert!(one_way_anova(&[vec![1.0], vec![]]).is_none());
    }

    #[test]
    fn kruskal_matches_hand_computation() {
        let r = kruskal_wallis(&two_groups()).unwrap();
        assert_relative_eq!(r.statistic, 27.0 / 7.0, epsilon = 1e-12);
        assert!(r.p_value > 0.04 && r.p_value < 0.06);
    }

    #[test]
    fn kruskal_all_tied_is_not_computable() {
        assert!(kruskal_wallis(&[vec![1.0, 1.0], vec![1.0]]).is_none());
    }

    #[test]
    fn chi_square_two_by_two_uses_yates() {
        let table = vec![vec![10.0, 20.0], vec![30.0, 40.0]];
        let r = chi_square_independence(&table).unwrap();
        assert_relative_eq!(r.statistic, 0.44642857142857145, epsilon = 1e-9);
        assert_eq!(r.dof, Some(1));
        assert!(r.p_value > 0.45 && r.p_value < 0.55);
    }

    #[test]
    fn chi_square_larger_table_skips_correction() {
        let table = vec![vec![10.0, 20.0], vec![20.0, 10.0], vec![15.0, 15.0]];
        let r = chi_square_independence(&table).unwrap();
        // expected is 15 everywhere: 4 cells off by 5 -> 4 * 25 / 15
        assert_relative_eq!(r.statistic, 100.0 / 15.0, epsilon = 1e-9);
        assert_eq!(r.dof, Some(2));
    }

    #[test]
    fn chi_square_drops_empty_margins() {
        let table = vec![vec![5.0, 0.0], vec![7.0, 0.0]];
        assert!(chi_square_independence(&table).is_none());
        assert!(chi_square_independence(&[]).is_none());
    }

    #[test]
    fn mann_whitney_asymptotic() {
        let r = mann_whitney_u(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_relative_eq!(r.statistic, 0.0);
        assert_relative_eq!(r.p_value, 0.0809, epsilon = 1e-3);
        assert!(mann_whitney_u(&[], &[1.0]).is_none());
    }

    #[test]
    fn mann_whitney_small_samples_stay_asymptotic() {
        let r = mann_whitney_u(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0]).unwrap();
        assert_relative_eq!(r.statistic, 0.0);
        // exact two-sided value would be 2/70
        assert_relative_eq!(r.p_value, 0.03038, epsilon = 1e-4);
        assert!(r.p_value > 2.0 / 70.0);
    }

    #[test]
    fn ranks_average_ties() {
        let (ranks, tie) = average_ranks(&[3.0, 1.0, 3.0, 2.0]);
        assert_eq!(ranks, vec![3.5, 1.0, 3.5, 2.0]);
        assert_eq!(tie, 6.0);
    }
}
