use foundation::{LatLng, PhotoId, Viewport};
use serde::{Deserialize, Serialize};

/// Screen-distance clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Markers whose projected screen distance is below this group together.
    pub radius_px: f64,
    /// At or above this zoom level markers never cluster.
    pub max_cluster_zoom: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_px: 80.0,
            max_cluster_zoom: 17.0,
        }
    }
}

/// Ephemeral grouping of nearby markers at the current zoom.
///
/// Recomputed on every viewport/zoom change and never persisted. A node with
/// a single member renders as a plain marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterNode {
    pub center: LatLng,
    pub members: Vec<PhotoId>,
}

impl ClusterNode {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

/// Groups markers by projected screen distance at the viewport's zoom.
///
/// Greedy and deterministic: markers are visited in the given order, each
/// unassigned marker seeds a cluster and absorbs every remaining marker
/// within `radius_px` of the seed. The cluster center is the member centroid.
pub fn cluster_markers(
    positions: &[(PhotoId, LatLng)],
    viewport: &Viewport,
    config: &ClusterConfig,
) -> Vec<ClusterNode> {
    if viewport.zoom >= config.max_cluster_zoom {
        return positions
            .iter()
            .map(|(id, at)| ClusterNode {
                center: *at,
                members: vec![*id],
            })
            .collect();
    }

    let projected: Vec<_> = positions
        .iter()
        .map(|(id, at)| (*id, *at, Viewport::project_world(*at, viewport.zoom)))
        .collect();

    let mut assigned = vec![false; projected.len()];
    let mut clusters = Vec::new();

    for seed in 0..projected.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let seed_screen = projected[seed].2;
        let mut members = vec![seed];

        for candidate in seed + 1..projected.len() {
            if assigned[candidate] {
                continue;
            }
            if seed_screen.distance(&projected[candidate].2) < config.radius_px {
                assigned[candidate] = true;
                members.push(candidate);
            }
        }

        let lat = members.iter().map(|&i| projected[i].1.lat).sum::<f64>() / members.len() as f64;
        let lng = members.iter().map(|&i| projected[i].1.lng).sum::<f64>() / members.len() as f64;
        clusters.push(ClusterNode {
            center: LatLng::new(lat, lng),
            members: members.iter().map(|&i| projected[i].0).collect(),
        });
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::{cluster_markers, ClusterConfig, ClusterNode};
    use foundation::{LatLng, PhotoId, Viewport};

    fn viewport(zoom: f64) -> Viewport {
        Viewport::new(LatLng::new(45.0, 25.0), zoom, 1024, 768)
    }

    fn member_ids(clusters: &[ClusterNode]) -> Vec<u64> {
        let mut ids: Vec<u64> = clusters
            .iter()
            .flat_map(|c| c.members.iter().map(|id| id.0))
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn nearby_markers_form_one_cluster() {
        let positions = vec![
            (PhotoId(1), LatLng::new(45.0, 25.0)),
            (PhotoId(2), LatLng::new(45.0, 25.01)),
        ];
        let clusters = cluster_markers(&positions, &viewport(7.0), &ClusterConfig::default());

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 2);
        assert_eq!(member_ids(&clusters), vec![1, 2]);
    }

    #[test]
    fn zooming_in_splits_the_cluster_without_id_loss() {
        let positions = vec![
            (PhotoId(1), LatLng::new(45.0, 25.0)),
            (PhotoId(2), LatLng::new(45.0, 25.01)),
        ];
        // At zoom 15 the pair is ~230 px apart, well past the radius.
        let clusters = cluster_markers(&positions, &viewport(15.0), &ClusterConfig::default());

        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.is_single()));
        assert_eq!(member_ids(&clusters), vec![1, 2]);
    }

    #[test]
    fn clustering_disabled_past_max_zoom() {
        let positions = vec![
            (PhotoId(1), LatLng::new(45.0, 25.0)),
            (PhotoId(2), LatLng::new(45.000001, 25.000001)),
        ];
        let clusters = cluster_markers(&positions, &viewport(17.0), &ClusterConfig::default());
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn cluster_center_is_member_centroid() {
        let positions = vec![
            (PhotoId(1), LatLng::new(45.0, 25.0)),
            (PhotoId(2), LatLng::new(45.0, 25.01)),
        ];
        let clusters = cluster_markers(&positions, &viewport(7.0), &ClusterConfig::default());
        assert!((clusters[0].center.lng - 25.005).abs() < 1e-9);
        assert!((clusters[0].center.lat - 45.0).abs() < 1e-9);
    }
}
