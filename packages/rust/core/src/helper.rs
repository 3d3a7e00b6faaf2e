//! Geometric helpers shared by clustering algorithms.

use pfcontent_shared::{CaloHitId, ClusterId, PfContentError, Result};

use crate::content::EventContent;

/// Smallest distance between a hit and any hit of a cluster.
pub fn closest_distance(content: &EventContent, hit: CaloHitId, cluster: ClusterId) -> Result<f32> {
    let position = content.calo_hit(hit)?.position;
    let mut closest = f32::MAX;

    for other in content.cluster(cluster)?.calo_hits() {
        let distance = position.distance_to(&content.calo_hit(*other)?.position);
        if distance < closest {
            closest = distance;
        }
    }

    Ok(closest)
}

/// Find the cluster closest to `hit`, scanning every cluster in list order.
///
/// Hit-to-cluster distance is the smallest hit-to-hit distance. On a tie the
/// earlier cluster wins. Fails with `NotFound` when no cluster lies within
/// `max_distance`.
pub fn find_closest_cluster(
    content: &EventContent,
    hit: CaloHitId,
    clusters: &[ClusterId],
    max_distance: f32,
) -> Result<ClusterId> {
    let mut best: Option<(ClusterId, f32)> = None;

    for &cluster in clusters {
        let distance = closest_distance(content, hit, cluster)?;
        if distance > max_distance {
            continue;
        }
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((cluster, distance));
        }
    }

    best.map(|(cluster, _)| cluster)
        .ok_or_else(|| PfContentError::not_found(format!("cluster within {max_distance} of {hit}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tests::content_with_hits;
    use pfcontent_shared::{ClusterParameters, StatusCode};

    fn seeded(xs: &[f32], seeds: &[u32]) -> (EventContent, Vec<ClusterId>) {
        let mut content = content_with_hits(xs);
        content.enter_algorithm("Test");
        content.create_temporary_cluster_list().expect("temp list");
        let clusters = seeds
            .iter()
            .map(|i| {
                content
                    .create_cluster(ClusterParameters {
                        calo_hits: vec![CaloHitId(*i)],
                    })
                    .expect("seed")
            })
            .collect();
        (content, clusters)
    }

    #[test]
    fn picks_nearest_cluster() {
        let (content, clusters) = seeded(&[0.0, 10.0, 7.0], &[0, 1]);
        let closest = find_closest_cluster(&content, CaloHitId(2), &clusters, f32::MAX)
            .expect("closest");
        assert_eq!(closest, clusters[1]);
    }

    #[test]
    fn uses_nearest_hit_in_cluster() {
        let (mut content, clusters) = seeded(&[0.0, 10.0, 4.0, 6.0], &[0, 1]);
        // Cluster 0 grows towards the query hit.
        content.add_to_cluster(clusters[0], CaloHitId(2)).expect("add");
        let distance = closest_distance(&content, CaloHitId(3), clusters[0]).expect("distance");
        assert!((distance - 2.0).abs() < 1e-6);
        let closest = find_closest_cluster(&content, CaloHitId(3), &clusters, f32::MAX)
            .expect("closest");
        assert_eq!(closest, clusters[0]);
    }

    #[test]
    fn ties_keep_scan_order() {
        let (content, clusters) = seeded(&[-1.0, 1.0, 0.0], &[0, 1]);
        let closest = find_closest_cluster(&content, CaloHitId(2), &clusters, f32::MAX)
            .expect("closest");
        assert_eq!(closest, clusters[0]);

        let reversed = [clusters[1], clusters[0]];
        let closest = find_closest_cluster(&content, CaloHitId(2), &reversed, f32::MAX)
            .expect("closest");
        assert_eq!(closest, clusters[1]);
    }

    #[test]
    fn nothing_within_range() {
        let (content, clusters) = seeded(&[0.0, 50.0], &[0]);
        let err = find_closest_cluster(&content, CaloHitId(1), &clusters, 10.0).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotFound);

        let err = find_closest_cluster(&content, CaloHitId(1), &[], f32::MAX).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotFound);
    }
}
