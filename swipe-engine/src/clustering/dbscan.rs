// Copyright 2026 X.AI Corp.
// DBSCAN clustering over content embeddings

use crate::error::EngineError;
use crate::util::vector_ops;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;
use swipe_store::{Cluster, ClusterAssignment, ContentId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Euclidean,
    Cosine,
    Manhattan,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbscanConfig {
    /// Neighborhood radius. Must be positive.
    pub epsilon: f32,
    /// Minimum neighborhood size (the point itself included) for a core
    /// point. Must be at least 2.
    pub min_points: usize,
    pub distance: DistanceMetric,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.3,
            min_points: 4,
            distance: DistanceMetric::Cosine,
        }
    }
}

/// Per-run statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClusteringStats {
    pub total_points: usize,
    pub clustered_points: usize,
    pub noise_points: usize,
    pub clusters_found: usize,
    pub elapsed_ms: u64,
    pub converged: bool,
}

/// Full output of one clustering run.
#[derive(Clone, Debug)]
pub struct ClusteringOutcome {
    pub clusters: Vec<Cluster>,
    pub assignments: Vec<ClusterAssignment>,
    /// (clustered / total) x mean cluster coherence, in [0, 1].
    pub quality: f32,
    pub stats: ClusteringStats,
}

impl ClusteringOutcome {
    fn empty() -> Self {
        Self {
            clusters: Vec::new(),
            assignments: Vec::new(),
            quality: 0.0,
            stats: ClusteringStats {
                converged: true,
                ..Default::default()
            },
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Member(usize),
}

pub struct DbscanClusterer {
    config: DbscanConfig,
}

impl DbscanClusterer {
    pub fn new(config: DbscanConfig) -> Result<Self, EngineError> {
        if !config.epsilon.is_finite() || config.epsilon <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "epsilon must be positive, got {}",
                config.epsilon
            )));
        }
        if config.min_points < 2 {
            return Err(EngineError::InvalidConfig(format!(
                "min_points must be at least 2, got {}",
                config.min_points
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &DbscanConfig {
        &self.config
    }

    /// Partition the points into dense clusters and noise.
    ///
    /// A point is never reassigned once it joins a cluster; noise points
    /// reached during expansion are promoted to border members. The full
    /// pairwise distance matrix is held in memory, so callers cap the input
    /// size.
    pub fn run(&self, points: &[(ContentId, Vec<f32>)]) -> Result<ClusteringOutcome, EngineError> {
        let started = Instant::now();
        let total = points.len();
        if total == 0 {
            return Ok(ClusteringOutcome::empty());
        }

        let dimension = points[0].1.len();
        for (_, vector) in points.iter() {
            if vector.len() != dimension {
                return Err(EngineError::InvalidDimension {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
        }

        let matrix = self.distance_matrix(points)?;
        let neighborhoods = |index: usize| -> Vec<usize> {
            (0..total)
                .filter(|&other| matrix[index * total + other] <= self.config.epsilon)
                .collect()
        };

        let mut labels = vec![Label::Unvisited; total];
        let mut cluster_count = 0usize;

        for point in 0..total {
            if labels[point] != Label::Unvisited {
                continue;
            }
            let neighbors = neighborhoods(point);
            if neighbors.len() < self.config.min_points {
                labels[point] = Label::Noise;
                continue;
            }

            let cluster_index = cluster_count;
            cluster_count += 1;
            labels[point] = Label::Member(cluster_index);

            let mut queue: VecDeque<usize> = neighbors.into_iter().collect();
            while let Some(candidate) = queue.pop_front() {
                match labels[candidate] {
                    Label::Noise => labels[candidate] = Label::Member(cluster_index),
                    Label::Unvisited => {
                        labels[candidate] = Label::Member(cluster_index);
                        let reachable = neighborhoods(candidate);
                        if reachable.len() >= self.config.min_points {
                            queue.extend(reachable);
                        }
                    }
                    Label::Member(_) => {}
                }
            }
        }

        self.build_outcome(points, &labels, cluster_count, total, started)
    }

    fn distance_matrix(&self, points: &[(ContentId, Vec<f32>)]) -> Result<Vec<f32>, EngineError> {
        let total = points.len();
        let mut matrix = vec![0.0f32; total * total];
        for i in 0..total {
            for j in (i + 1)..total {
                let distance = self.distance(&points[i].1, &points[j].1)?;
                matrix[i * total + j] = distance;
                matrix[j * total + i] = distance;
            }
        }
        Ok(matrix)
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32, EngineError> {
        match self.config.distance {
            DistanceMetric::Euclidean => vector_ops::euclidean_distance(a, b),
            DistanceMetric::Cosine => Ok(1.0 - vector_ops::cosine_similarity(a, b)?),
            DistanceMetric::Manhattan => vector_ops::manhattan_distance(a, b),
        }
    }

    fn build_outcome(
        &self,
        points: &[(ContentId, Vec<f32>)],
        labels: &[Label],
        cluster_count: usize,
        total: usize,
        started: Instant,
    ) -> Result<ClusteringOutcome, EngineError> {
        let now = Utc::now();
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
        for (index, label) in labels.iter().enumerate() {
            if let Label::Member(cluster_index) = label {
                members[*cluster_index].push(index);
            }
        }

        let mut clusters = Vec::with_capacity(cluster_count);
        let mut assignments = Vec::new();
        let mut coherence_sum = 0.0f32;

        for (cluster_index, member_indices) in members.iter().enumerate() {
            if member_indices.is_empty() {
                continue;
            }
            let vectors: Vec<Vec<f32>> = member_indices
                .iter()
                .map(|&i| points[i].1.clone())
                .collect();
            let centroid = vector_ops::normalize_l2(&vector_ops::average_vectors(&vectors)?);

            let mut spread = 0.0f32;
            for vector in &vectors {
                spread += vector_ops::euclidean_distance(vector, &centroid)?;
            }
            let coherence = (1.0 - spread / member_indices.len() as f32).max(0.0);
            coherence_sum += coherence;

            let size = member_indices.len();
            let density =
                size as f32 / (std::f32::consts::PI * self.config.epsilon * self.config.epsilon);

            for &member in member_indices {
                let similarity = vector_ops::cosine_similarity(&points[member].1, &centroid)?
                    .clamp(0.0, 1.0);
                assignments.push(ClusterAssignment {
                    content_id: points[member].0,
                    cluster_id: cluster_index as u64,
                    similarity,
                    assigned_at: now,
                });
            }

            clusters.push(Cluster {
                id: cluster_index as u64,
                centroid,
                size,
                density,
                coherence,
                topics: Vec::new(),
                active_hours: None,
                geo_focus: None,
                languages: Vec::new(),
                created_at: now,
                updated_at: now,
            });
        }

        let clustered = assignments.len();
        let noise = total - clustered;
        let quality = if clusters.is_empty() {
            0.0
        } else {
            (clustered as f32 / total as f32) * (coherence_sum / clusters.len() as f32)
        };

        Ok(ClusteringOutcome {
            quality,
            stats: ClusteringStats {
                total_points: total,
                clustered_points: clustered,
                noise_points: noise,
                clusters_found: clusters.len(),
                elapsed_ms: started.elapsed().as_millis() as u64,
                converged: true,
            },
            clusters,
            assignments,
        })
    }
}
