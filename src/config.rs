//! Analysis configuration.

use crate::barrier::Barrier;

/// Tunable parameters for one region analysis.
///
/// All distances are meters in the common planar CRS. The defaults mirror
/// the national-analysis settings; construct with struct-update syntax to
/// override individual fields:
///
/// ```
/// use hydronet::Config;
///
/// let config = Config {
///     max_snap_dist: 250.0,
///     ..Config::default()
/// };
/// assert_eq!(config.endpoint_epsilon, 1.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Upper bound for snapping a barrier to a flowline.
    pub max_snap_dist: f64,
    /// Snap positions closer than this to a flowline endpoint collapse onto
    /// the endpoint instead of producing a sliver cut.
    pub endpoint_epsilon: f64,
    /// Token-set similarity at or above which names count as a fuzzy match.
    pub name_similarity_threshold: f64,
    /// First id minted for cut products. When `None`, minting starts one
    /// above the largest vendor id in the merged store.
    pub id_counter_base: Option<u64>,
    /// Which snapped barriers sever the network. The default severs all of
    /// them; an analysis of dams only would supply its own predicate.
    pub barrier_cuts: fn(&Barrier) -> bool,
}

fn every_barrier(_: &Barrier) -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_snap_dist: 100.0,
            endpoint_epsilon: 1.0,
            name_similarity_threshold: 0.8,
            id_counter_base: None,
            barrier_cuts: every_barrier,
        }
    }
}
