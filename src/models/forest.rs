//! Random Forest регрессия (бэггинг деревьев CART)

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Гиперпараметры леса
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    /// None = без ограничения глубины
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Сколько признаков рассматривать в каждом узле (None = все)
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Узел хранится в плоском массиве, дети адресуются индексами
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Дерево регрессии
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct TreeBuilder<'a> {
    X: &'a Array2<f64>,
    y: &'a Array1<f64>,
    params: &'a ForestParams,
    n_candidates: usize,
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn fit(
        X: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = X.ncols();
        let n_candidates = params
            .max_features
            .map_or(n_features, |m| m.clamp(1, n_features));

        let mut builder = TreeBuilder {
            X,
            y,
            params,
            n_candidates,
            nodes: Vec::new(),
        };
        builder.build(indices, 0, rng);

        Self {
            nodes: builder.nodes,
        }
    }

    pub fn predict_row(&self, sample: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    /// Проверка ссылок между узлами (после загрузки из файла)
    fn is_well_formed(&self, n_features: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                TreeNode::Leaf { value } => value.is_finite(),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    *feature < n_features
                        && threshold.is_finite()
                        && *left > i
                        && *right > i
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

impl<'a> TreeBuilder<'a> {
    /// Строит поддерево и возвращает индекс его корня
    fn build(&mut self, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let node_idx = self.nodes.len();
        let mean = indices.iter().map(|&i| self.y[i]).sum::<f64>() / indices.len() as f64;
        self.nodes.push(TreeNode::Leaf { value: mean });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || indices.len() < self.params.min_samples_split.max(2) {
            return node_idx;
        }

        let Some(split) = self.best_split(&indices, rng) else {
            return node_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.X[[i, split.feature]] <= split.threshold);

        let left = self.build(left_indices, depth + 1, rng);
        let right = self.build(right_indices, depth + 1, rng);
        self.nodes[node_idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }

    /// Лучшее разделение по сумме квадратов ошибок детей
    fn best_split(&self, indices: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| self.y[i] * self.y[i]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;
        if parent_sse <= 1e-12 {
            return None;
        }

        let min_leaf = self.params.min_samples_leaf.max(1);
        let features = index::sample(rng, self.X.ncols(), self.n_candidates).into_vec();

        let mut best: Option<SplitCandidate> = None;
        for feature in features {
            let mut sorted: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (self.X[[i, feature]], self.y[i]))
                .collect();
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 0..n - 1 {
                let (x, target) = sorted[k];
                left_sum += target;
                left_sq += target * target;

                let left_n = k + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let next_x = sorted[k + 1].0;
                if next_x - x <= f64::EPSILON * x.abs().max(1.0) {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let score = (left_sq - left_sum * left_sum / left_n as f64)
                    + (right_sq - right_sum * right_sum / right_n as f64);

                if best.as_ref().map_or(true, |b| score < b.score) {
                    let mut threshold = x + (next_x - x) / 2.0;
                    if threshold >= next_x {
                        threshold = x;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }

        best.filter(|b| b.score < parent_sse)
    }
}

/// Ансамбль деревьев, предсказание = среднее по деревьям
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn fit(X: &Array2<f64>, y: &Array1<f64>, params: &ForestParams) -> Result<Self, ModelError> {
        let n_samples = X.nrows();
        if n_samples == 0 || X.ncols() == 0 {
            return Err(ModelError::EmptyDataset);
        }
        if y.len() != n_samples {
            return Err(ModelError::LengthMismatch {
                rows: n_samples,
                targets: y.len(),
            });
        }
        if X.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("training data"));
        }

        let n_trees = params.n_trees.max(1);
        let trees = (0..n_trees)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let indices: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                RegressionTree::fit(X, y, indices, params, &mut rng)
            })
            .collect::<Vec<_>>();

        let depth = trees.iter().map(RegressionTree::depth).max().unwrap_or(0);
        tracing::debug!(n_trees, n_samples, max_depth = depth, "Random forest fitted");

        Ok(Self {
            params: params.clone(),
            n_features: X.ncols(),
            trees,
        })
    }

    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if X.ncols() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                got: X.ncols(),
            });
        }

        let mut predictions = Array1::zeros(X.nrows());
        for (i, row) in X.rows().into_iter().enumerate() {
            predictions[i] = self.predict_row(row);
        }
        Ok(predictions)
    }

    pub fn predict_one(&self, x: &Array1<f64>) -> Result<f64, ModelError> {
        if x.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                got: x.len(),
            });
        }
        Ok(self.predict_row(x.view()))
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }
}
