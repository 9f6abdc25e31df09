use serde::Serialize;
use shared::LatLng;

use crate::provider::{ElevationService, MAX_ELEVATION_PATH, MAX_ELEVATION_SAMPLES};
use crate::segments::Segment;

/// Whole-route totals, always derived from the current segments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RouteMetrics {
    pub total_distance_km: f64,
    pub elevation_gain_m: i64,
    pub elevation_loss_m: i64,
}

/// Unrounded climb and descent over a path.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElevationTotals {
    pub gain: f64,
    pub loss: f64,
}

impl ElevationTotals {
    /// Sums positive steps into gain and negative steps into loss.
    pub fn from_samples(elevations: &[f64]) -> Self {
        let mut totals = Self::default();
        for window in elevations.windows(2) {
            let diff = window[1] - window[0];
            if diff > 0.0 {
                totals.gain += diff;
            } else {
                totals.loss += diff.abs();
            }
        }
        totals
    }

    fn add(&mut self, other: Self) {
        self.gain += other.gain;
        self.loss += other.loss;
    }
}

/// An elevation pass over the concatenated path, tagged for last-write-wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationRequest {
    pub generation: u64,
    pub path: Vec<LatLng>,
}

pub fn total_distance_km(segments: &[Segment]) -> f64 {
    let meters: f64 = segments.iter().map(Segment::distance_meters).sum();
    round_to_hundredths(meters / 1000.0)
}

pub fn concatenated_path(segments: &[Segment]) -> Vec<LatLng> {
    segments
        .iter()
        .flat_map(|segment| segment.path.iter().copied())
        .collect()
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Recomputes [`RouteMetrics`] whenever the segment store changes.
///
/// Distance is updated synchronously. Elevation needs a provider round trip,
/// so each pass gets a new generation and only the latest one may publish.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    metrics: RouteMetrics,
    generation: u64,
}

impl MetricsAggregator {
    pub fn on_segments_changed(&mut self, segments: &[Segment]) -> Option<ElevationRequest> {
        self.generation += 1;

        if segments.is_empty() {
            self.metrics = RouteMetrics::default();
            return None;
        }

        self.metrics.total_distance_km = total_distance_km(segments);
        Some(ElevationRequest {
            generation: self.generation,
            path: concatenated_path(segments),
        })
    }

    /// Applies an elevation result. Returns `false` if a newer pass was issued
    /// after `generation`, in which case the result is discarded.
    pub fn publish(&mut self, generation: u64, totals: ElevationTotals) -> bool {
        if generation != self.generation {
            return false;
        }
        self.metrics.elevation_gain_m = totals.gain.round() as i64;
        self.metrics.elevation_loss_m = totals.loss.round() as i64;
        true
    }

    pub fn metrics(&self) -> RouteMetrics {
        self.metrics
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Splits `path` into provider-sized chunks, each paired with its sample count.
pub fn elevation_chunks(path: &[LatLng]) -> impl Iterator<Item = (&[LatLng], usize)> {
    path.chunks(MAX_ELEVATION_PATH)
        .map(|chunk| (chunk, chunk.len().min(MAX_ELEVATION_SAMPLES)))
}

/// Queries elevation chunk by chunk and accumulates gain and loss.
///
/// A failed chunk is logged and contributes nothing; the rest still count.
/// Returns `None` when no chunk succeeded, so the caller keeps the previous
/// totals instead of publishing zeros.
pub async fn fetch_elevation_totals<E>(service: &E, path: &[LatLng]) -> Option<ElevationTotals>
where
    E: ElevationService,
{
    let mut totals = ElevationTotals::default();
    let mut answered = false;

    for (index, (chunk, samples)) in elevation_chunks(path).enumerate() {
        if chunk.len() < 2 {
            continue;
        }
        match service.elevation_along_path(chunk, samples).await {
            Ok(elevations) => {
                answered = true;
                totals.add(ElevationTotals::from_samples(&elevations));
            }
            Err(err) => tracing::warn!("elevation chunk {index} failed: {err}"),
        }
    }

    if !answered {
        tracing::warn!("no elevation data for {} points", path.len());
        return None;
    }

    tracing::debug!(
        "elevation over {} points: +{:.1}m / -{:.1}m",
        path.len(),
        totals.gain,
        totals.loss
    );
    Some(totals)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::computer::SegmentRequest;
    use crate::error::ProviderError;
    use crate::provider::{Directions, Leg};
    use crate::render::{MapRenderer, PathStyle, RenderHandle, TracingRenderer};

    fn segment(origin: usize, meters: f64, path: Vec<LatLng>) -> Segment {
        let renderer: Arc<dyn MapRenderer> = Arc::new(TracingRenderer::default());
        let request = SegmentRequest {
            generation: 0,
            origin_index: origin,
            destination_index: origin + 1,
            origin: path[0],
            destination: path[path.len() - 1],
        };
        let handle = RenderHandle::path(&renderer, &path, PathStyle::Segment);
        let directions = Directions {
            path,
            legs: vec![Leg {
                distance_meters: meters,
                duration_seconds: 0.0,
            }],
            via_points: Vec::new(),
        };
        Segment::new(&request, directions, handle)
    }

    fn line(n: usize) -> Vec<LatLng> {
        (0..n).map(|i| LatLng::new(0.0, i as f64 * 1e-4)).collect()
    }

    #[test]
    fn distance_sums_legs_in_kilometres() {
        let segments = vec![segment(0, 500.0, line(2)), segment(1, 1200.0, line(2))];
        assert_eq!(total_distance_km(&segments), 1.70);
    }

    #[test]
    fn distance_rounds_to_two_decimals() {
        let segments = vec![segment(0, 1234.567, line(2))];
        assert_eq!(total_distance_km(&segments), 1.23);
    }

    #[test]
    fn gain_and_loss_from_samples() {
        let totals = ElevationTotals::from_samples(&[10.0, 15.0, 12.0, 20.0]);
        assert_eq!(totals.gain, 13.0);
        assert_eq!(totals.loss, 3.0);
    }

    #[test]
    fn flat_or_single_sample_has_no_change() {
        assert_eq!(ElevationTotals::from_samples(&[]), ElevationTotals::default());
        assert_eq!(ElevationTotals::from_samples(&[42.0]), ElevationTotals::default());
        assert_eq!(
            ElevationTotals::from_samples(&[5.0, 5.0, 5.0]),
            ElevationTotals::default()
        );
    }

    #[test]
    fn path_is_concatenated_in_store_order() {
        let a = line(3);
        let b: Vec<LatLng> = (0..2).map(|i| LatLng::new(1.0, i as f64)).collect();
        let segments = vec![segment(0, 1.0, a.clone()), segment(1, 1.0, b.clone())];

        let path = concatenated_path(&segments);
        assert_eq!(path.len(), 5);
        assert_eq!(&path[..3], &a[..]);
        assert_eq!(&path[3..], &b[..]);
    }

    #[test]
    fn chunks_respect_provider_limits() {
        let path = line(1100);
        let chunks: Vec<(usize, usize)> = elevation_chunks(&path)
            .map(|(chunk, samples)| (chunk.len(), samples))
            .collect();
        assert_eq!(chunks, vec![(512, 256), (512, 256), (76, 76)]);
    }

    #[test]
    fn empty_store_resets_metrics_synchronously() {
        let mut aggregator = MetricsAggregator::default();
        let request = aggregator
            .on_segments_changed(&[segment(0, 800.0, line(2))])
            .unwrap();
        aggregator.publish(request.generation, ElevationTotals { gain: 4.4, loss: 2.6 });
        assert_eq!(aggregator.metrics().elevation_gain_m, 4);
        assert_eq!(aggregator.metrics().elevation_loss_m, 3);

        assert!(aggregator.on_segments_changed(&[]).is_none());
        assert_eq!(aggregator.metrics(), RouteMetrics::default());
    }

    #[test]
    fn only_latest_pass_publishes() {
        let mut aggregator = MetricsAggregator::default();
        let first = aggregator
            .on_segments_changed(&[segment(0, 500.0, line(2))])
            .unwrap();
        let second = aggregator
            .on_segments_changed(&[segment(0, 500.0, line(2)), segment(1, 500.0, line(2))])
            .unwrap();

        assert!(aggregator.publish(second.generation, ElevationTotals { gain: 20.0, loss: 0.0 }));
        assert!(!aggregator.publish(first.generation, ElevationTotals { gain: 5.0, loss: 0.0 }));
        assert_eq!(aggregator.metrics().elevation_gain_m, 20);
        assert_eq!(aggregator.metrics().total_distance_km, 1.0);
    }

    #[test]
    fn result_after_clear_is_discarded() {
        let mut aggregator = MetricsAggregator::default();
        let request = aggregator
            .on_segments_changed(&[segment(0, 500.0, line(2))])
            .unwrap();
        aggregator.on_segments_changed(&[]);

        assert!(!aggregator.publish(request.generation, ElevationTotals { gain: 9.0, loss: 9.0 }));
        assert_eq!(aggregator.metrics(), RouteMetrics::default());
    }

    /// Answers chunk requests from a script; `None` entries fail.
    struct ScriptedElevation {
        responses: Mutex<Vec<Option<Vec<f64>>>>,
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl ElevationService for ScriptedElevation {
        async fn elevation_along_path(
            &self,
            path: &[LatLng],
            samples: usize,
        ) -> Result<Vec<f64>, ProviderError> {
            self.calls.lock().unwrap().push((path.len(), samples));
            let next = self.responses.lock().unwrap().remove(0);
            next.ok_or(ProviderError::NoResult)
        }
    }

    #[tokio::test]
    async fn failed_chunk_is_skipped() {
        let service = ScriptedElevation {
            responses: Mutex::new(vec![Some(vec![10.0, 15.0, 12.0, 20.0]), None, Some(vec![0.0, 4.0])]),
            calls: Mutex::new(Vec::new()),
        };

        let totals = fetch_elevation_totals(&service, &line(1100)).await;

        assert_eq!(totals, Some(ElevationTotals { gain: 17.0, loss: 3.0 }));
        assert_eq!(
            *service.calls.lock().unwrap(),
            vec![(512, 256), (512, 256), (76, 76)]
        );
    }

    #[tokio::test]
    async fn all_chunks_failing_yields_nothing() {
        let service = ScriptedElevation {
            responses: Mutex::new(vec![None, None]),
            calls: Mutex::new(Vec::new()),
        };

        let totals = fetch_elevation_totals(&service, &line(600)).await;

        assert_eq!(totals, None);
        assert_eq!(service.calls.lock().unwrap().len(), 2);
    }
}
