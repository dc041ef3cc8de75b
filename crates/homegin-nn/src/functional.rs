//! Functional API - Stateless Graph Operations
//!
//! Scatter reductions used for message passing and graph readout, plus the
//! softmax helpers behind the classification loss. Every reduction returns a
//! `PoolCache` that its backward pass consumes.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::fmt;
use std::str::FromStr;

use homegin_core::{Error, GraphStructure, Result, Tensor};
use serde::{Deserialize, Serialize};

// =============================================================================
// Aggregation
// =============================================================================

/// Reduction used to combine a set of rows into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Elementwise sum.
    #[default]
    Sum,
    /// Elementwise mean.
    Mean,
    /// Elementwise maximum.
    Max,
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "mean" | "average" => Ok(Aggregation::Mean),
            "max" => Ok(Aggregation::Max),
            other => Err(Error::invalid_operation(format!(
                "unknown pooling '{other}', expected sum, mean or max"
            ))),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Max => "max",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Scatter Reduction
// =============================================================================

/// What a scatter reduction needs to route gradients back to its inputs.
#[derive(Debug, Clone)]
pub struct PoolCache {
    kind: Aggregation,
    num_inputs: usize,
    cols: usize,
    /// (input row, output row) contributions.
    pairs: Vec<(usize, usize)>,
    /// Contributions per output row.
    counts: Vec<usize>,
    /// For max: the winning input row per output element.
    argmax: Vec<Option<usize>>,
}

/// Reduces input rows into `num_outputs` rows following `pairs`.
///
/// Output rows that receive no contribution are zero.
pub fn scatter_reduce(
    input: &Tensor,
    pairs: Vec<(usize, usize)>,
    num_outputs: usize,
    kind: Aggregation,
) -> Result<(Tensor, PoolCache)> {
    let num_inputs = input.rows()?;
    let cols = input.cols()?;
    let mut output = Tensor::zeros(&[num_outputs, cols]);
    let mut counts = vec![0usize; num_outputs];
    let mut argmax: Vec<Option<usize>> = Vec::new();

    for &(i, o) in &pairs {
        if i >= num_inputs {
            return Err(Error::IndexOutOfBounds {
                index: i,
                size: num_inputs,
            });
        }
        if o >= num_outputs {
            return Err(Error::IndexOutOfBounds {
                index: o,
                size: num_outputs,
            });
        }
        counts[o] += 1;
    }

    match kind {
        Aggregation::Sum | Aggregation::Mean => {
            for &(i, o) in &pairs {
                let src = input.row(i);
                for (y, &x) in output.row_mut(o).iter_mut().zip(src) {
                    *y += x;
                }
            }
            if kind == Aggregation::Mean {
                for (o, &count) in counts.iter().enumerate() {
                    if count > 0 {
                        let inv = 1.0 / count as f32;
                        output.row_mut(o).iter_mut().for_each(|y| *y *= inv);
                    }
                }
            }
        }
        Aggregation::Max => {
            argmax = vec![None; num_outputs * cols];
            for &(i, o) in &pairs {
                let src = input.row(i);
                let dst = output.row_mut(o);
                for j in 0..cols {
                    let slot = &mut argmax[o * cols + j];
                    if slot.is_none() || src[j] > dst[j] {
                        dst[j] = src[j];
                        *slot = Some(i);
                    }
                }
            }
        }
    }

    Ok((
        output,
        PoolCache {
            kind,
            num_inputs,
            cols,
            pairs,
            counts,
            argmax,
        },
    ))
}

/// Routes `grad_output` of a scatter reduction back to its input rows.
pub fn scatter_reduce_backward(grad_output: &Tensor, cache: &PoolCache) -> Result<Tensor> {
    let expected = [cache.counts.len(), cache.cols];
    if grad_output.shape() != expected {
        return Err(Error::shape_mismatch(&expected, grad_output.shape()));
    }
    let mut grad_input = Tensor::zeros(&[cache.num_inputs, cache.cols]);

    match cache.kind {
        Aggregation::Sum | Aggregation::Mean => {
            for &(i, o) in &cache.pairs {
                let scale = if cache.kind == Aggregation::Mean {
                    1.0 / cache.counts[o] as f32
                } else {
                    1.0
                };
                let g = grad_output.row(o);
                for (gx, &gy) in grad_input.row_mut(i).iter_mut().zip(g) {
                    *gx += gy * scale;
                }
            }
        }
        Aggregation::Max => {
            for o in 0..cache.counts.len() {
                for j in 0..cache.cols {
                    if let Some(i) = cache.argmax[o * cache.cols + j] {
                        grad_input.row_mut(i)[j] += grad_output.row(o)[j];
                    }
                }
            }
        }
    }
    Ok(grad_input)
}

// =============================================================================
// Graph Operations
// =============================================================================

/// Aggregates each node's in-neighbour features.
///
/// Nodes without incoming edges receive zeros.
pub fn neighbor_aggregate(
    graph: &GraphStructure,
    h: &Tensor,
    kind: Aggregation,
) -> Result<(Tensor, PoolCache)> {
    if h.rows()? != graph.num_nodes() {
        return Err(Error::shape_mismatch(
            &[graph.num_nodes(), h.cols()?],
            h.shape(),
        ));
    }
    let pairs = graph
        .src()
        .iter()
        .zip(graph.dst())
        .map(|(&s, &d)| (s, d))
        .collect();
    scatter_reduce(h, pairs, graph.num_nodes(), kind)
}

/// Pools node features into one row per graph.
pub fn graph_readout(
    graph: &GraphStructure,
    h: &Tensor,
    kind: Aggregation,
) -> Result<(Tensor, PoolCache)> {
    if h.rows()? != graph.num_nodes() {
        return Err(Error::shape_mismatch(
            &[graph.num_nodes(), h.cols()?],
            h.shape(),
        ));
    }
    let pairs = (0..graph.num_graphs())
        .flat_map(|g| graph.graph_nodes(g).map(move |n| (n, g)))
        .collect();
    scatter_reduce(h, pairs, graph.num_graphs(), kind)
}

// =============================================================================
// Softmax
// =============================================================================

/// Row-wise log softmax of a 2-D tensor.
pub fn log_softmax(input: &Tensor) -> Result<Tensor> {
    let rows = input.rows()?;
    let mut output = input.clone();
    for r in 0..rows {
        let row = output.row_mut(r);
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let log_sum = row.iter().map(|&x| (x - max).exp()).sum::<f32>().ln() + max;
        row.iter_mut().for_each(|x| *x -= log_sum);
    }
    Ok(output)
}

/// Row-wise softmax of a 2-D tensor.
pub fn softmax(input: &Tensor) -> Result<Tensor> {
    Ok(log_softmax(input)?.map(f32::exp))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> GraphStructure {
        // 0 -> 1, 2 -> 1, 1 -> 2; node 0 has no in-edges
        GraphStructure::single(3, vec![0, 2, 1], vec![1, 1, 2]).unwrap()
    }

    fn features() -> Tensor {
        Tensor::from_vec(vec![1.0, -1.0, 2.0, 0.5, 3.0, -2.0], &[3, 2]).unwrap()
    }

    #[test]
    fn test_aggregation_parse_and_display() {
        assert_eq!("sum".parse::<Aggregation>().unwrap(), Aggregation::Sum);
        assert_eq!("Average".parse::<Aggregation>().unwrap(), Aggregation::Mean);
        assert_eq!("MAX".parse::<Aggregation>().unwrap(), Aggregation::Max);
        assert!("median".parse::<Aggregation>().is_err());
        assert_eq!(Aggregation::Mean.to_string(), "mean");
    }

    #[test]
    fn test_neighbor_sum_mean_max() {
        let g = path_graph();
        let h = features();

        let (sum, _) = neighbor_aggregate(&g, &h, Aggregation::Sum).unwrap();
        assert_eq!(sum.to_vec(), vec![0.0, 0.0, 4.0, -3.0, 2.0, 0.5]);

        let (mean, _) = neighbor_aggregate(&g, &h, Aggregation::Mean).unwrap();
        assert_eq!(mean.to_vec(), vec![0.0, 0.0, 2.0, -1.5, 2.0, 0.5]);

        let (max, _) = neighbor_aggregate(&g, &h, Aggregation::Max).unwrap();
        assert_eq!(max.to_vec(), vec![0.0, 0.0, 3.0, -1.0, 2.0, 0.5]);
    }

    #[test]
    fn test_readout_over_batched_graphs() {
        let g = GraphStructure::new(3, vec![], vec![], vec![0, 2, 3]).unwrap();
        let h = features();
        let (sum, _) = graph_readout(&g, &h, Aggregation::Sum).unwrap();
        assert_eq!(sum.to_vec(), vec![3.0, -0.5, 3.0, -2.0]);
        let (mean, _) = graph_readout(&g, &h, Aggregation::Mean).unwrap();
        assert_eq!(mean.to_vec(), vec![1.5, -0.25, 3.0, -2.0]);
    }

    #[test]
    fn test_scatter_backward_matches_finite_differences() {
        let g = path_graph();
        let h = features();
        let coeff = [0.3f32, -0.8, 1.1, 0.4, -0.6, 0.9];

        for kind in [Aggregation::Sum, Aggregation::Mean, Aggregation::Max] {
            let loss = |x: &Tensor| -> f32 {
                let (y, _) = neighbor_aggregate(&g, x, kind).unwrap();
                y.as_slice().iter().zip(coeff).map(|(a, b)| a * b).sum()
            };
            let (_, cache) = neighbor_aggregate(&g, &h, kind).unwrap();
            let grad_out = Tensor::from_vec(coeff.to_vec(), &[3, 2]).unwrap();
            let grad = scatter_reduce_backward(&grad_out, &cache).unwrap();

            let eps = 1e-3;
            for i in 0..h.numel() {
                let mut plus = h.clone();
                plus.as_mut_slice()[i] += eps;
                let mut minus = h.clone();
                minus.as_mut_slice()[i] -= eps;
                let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
                assert!(
                    (numeric - grad.as_slice()[i]).abs() < 1e-2,
                    "{kind} index {i}: {numeric} vs {}",
                    grad.as_slice()[i]
                );
            }
        }
    }

    #[test]
    fn test_log_softmax_rows_normalize() {
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 1000.0, 0.0, -1000.0], &[2, 3]).unwrap();
        let p = softmax(&x).unwrap();
        for r in 0..2 {
            let s: f32 = p.row(r).iter().sum();
            assert!((s - 1.0).abs() < 1e-5);
        }
        assert!(log_softmax(&x).unwrap().as_slice().iter().all(|v| v.is_finite()));
    }
}
