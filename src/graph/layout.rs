//! Layout algorithms for relation graphs.
//!
//! Every algorithm is a pure function from a graph to one raw position per
//! node, in node order. Raw positions live in an arbitrary coordinate space;
//! [`rescale`] maps them onto the canvas.

use std::convert::Infallible;
use std::f64::consts::PI;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::RelationGraph;

/// A raw or rescaled 2D position.
pub type Position = (f64, f64);

/// Available layout algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutAlgorithm {
    /// Fruchterman-Reingold spring simulation.
    #[default]
    Force,
    /// Concentric rings grouped by node degree.
    Shell,
    /// All nodes on one circle.
    Circular,
    /// Second and third Laplacian eigenvectors.
    Spectral,
    /// Nodes evenly spaced along an Archimedean spiral.
    Spiral,
}

impl LayoutAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutAlgorithm::Force => "force",
            LayoutAlgorithm::Shell => "shell",
            LayoutAlgorithm::Circular => "circular",
            LayoutAlgorithm::Spectral => "spectral",
            LayoutAlgorithm::Spiral => "spiral",
        }
    }

    /// Compute raw positions for every node of `graph`.
    pub fn layout(&self, graph: &RelationGraph, seed: u64) -> Vec<Position> {
        match self {
            LayoutAlgorithm::Force => force_layout(graph, seed, &ForceParams::default()),
            LayoutAlgorithm::Shell => shell_layout(graph),
            LayoutAlgorithm::Circular => circular_layout(graph.node_count()),
            LayoutAlgorithm::Spectral => spectral_layout(graph, seed),
            LayoutAlgorithm::Spiral => spiral_layout(graph.node_count()),
        }
    }
}

/// Unknown names fall back to the force layout.
impl FromStr for LayoutAlgorithm {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "shell" => LayoutAlgorithm::Shell,
            "circular" | "circle" => LayoutAlgorithm::Circular,
            "spectral" => LayoutAlgorithm::Spectral,
            "spiral" => LayoutAlgorithm::Spiral,
            _ => LayoutAlgorithm::Force,
        })
    }
}

/// Simulation parameters for [`force_layout`].
#[derive(Clone, Debug)]
pub struct ForceParams {
    pub iterations: usize,
    /// Starting displacement cap, cooled linearly to zero.
    pub initial_temperature: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            iterations: 50,
            initial_temperature: 0.1,
        }
    }
}

/// Fruchterman-Reingold layout in the unit square, seeded for repeatability.
pub fn force_layout(graph: &RelationGraph, seed: u64, params: &ForceParams) -> Vec<Position> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![(0.0, 0.0)];
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions: Vec<Position> = (0..n)
        .map(|_| (rng.random::<f64>(), rng.random::<f64>()))
        .collect();
    let k = (1.0 / n as f64).sqrt();
    let edges = graph.undirected_pairs();

    for step in 0..params.iterations {
        let temperature =
            params.initial_temperature * (1.0 - step as f64 / params.iterations as f64);
        let mut displacement = vec![(0.0_f64, 0.0_f64); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy, dist) = delta(positions[i], positions[j]);
                let force = k * k / dist;
                displacement[i].0 += dx / dist * force;
                displacement[i].1 += dy / dist * force;
                displacement[j].0 -= dx / dist * force;
                displacement[j].1 -= dy / dist * force;
            }
        }

        for &(a, b) in &edges {
            let (dx, dy, dist) = delta(positions[a], positions[b]);
            let force = dist * dist / k;
            displacement[a].0 -= dx / dist * force;
            displacement[a].1 -= dy / dist * force;
            displacement[b].0 += dx / dist * force;
            displacement[b].1 += dy / dist * force;
        }

        for (position, (dx, dy)) in positions.iter_mut().zip(displacement) {
            let length = (dx * dx + dy * dy).sqrt().max(1e-9);
            let capped = length.min(temperature);
            position.0 += dx / length * capped;
            position.1 += dy / length * capped;
        }
    }

    positions
}

fn delta(a: Position, b: Position) -> (f64, f64, f64) {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx, dy, (dx * dx + dy * dy).sqrt().max(1e-6))
}

/// Nodes evenly spaced on the unit circle.
pub fn circular_layout(n: usize) -> Vec<Position> {
    if n == 1 {
        return vec![(0.0, 0.0)];
    }
    (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            (angle.cos(), angle.sin())
        })
        .collect()
}

/// Concentric shells, highest degree innermost. A lone node in the first
/// shell sits at the center.
pub fn shell_layout(graph: &RelationGraph) -> Vec<Position> {
    let n = graph.node_count();
    let mut degrees: Vec<usize> = (0..n).map(|idx| graph.degree(idx)).collect();
    degrees.sort_unstable_by(|a, b| b.cmp(a));
    degrees.dedup();

    let shells: Vec<Vec<usize>> = degrees
        .iter()
        .map(|&degree| (0..n).filter(|&idx| graph.degree(idx) == degree).collect())
        .collect();

    let mut positions = vec![(0.0, 0.0); n];
    let offset = if shells.first().is_some_and(|shell| shell.len() == 1) {
        0.0
    } else {
        1.0
    };
    for (ring, members) in shells.iter().enumerate() {
        let radius = ring as f64 + offset;
        for (slot, &idx) in members.iter().enumerate() {
            let angle = 2.0 * PI * slot as f64 / members.len() as f64;
            positions[idx] = (radius * angle.cos(), radius * angle.sin());
        }
    }
    positions
}

/// Nodes one unit apart along an Archimedean spiral.
pub fn spiral_layout(n: usize) -> Vec<Position> {
    let mut theta: f64 = 1.0;
    let mut positions = Vec::with_capacity(n);
    for _ in 0..n {
        positions.push((theta * theta.cos(), theta * theta.sin()));
        theta += 1.0 / theta;
    }
    positions
}

/// Spectral layout from the Laplacian's second and third smallest
/// eigenvectors, found by power iteration on `c*I - L` with deflation.
/// Graphs with fewer than three nodes fall back to the circular layout.
pub fn spectral_layout(graph: &RelationGraph, seed: u64) -> Vec<Position> {
    let n = graph.node_count();
    if n < 3 {
        return circular_layout(n);
    }

    let max_degree = (0..n).map(|idx| graph.degree(idx)).max().unwrap_or(0);
    let shift = 2.0 * max_degree as f64 + 1.0;
    let apply = |v: &[f64]| -> Vec<f64> {
        (0..n)
            .map(|i| {
                let neighbour_sum: f64 = graph.neighbours(i).map(|j| v[j]).sum();
                let laplacian = graph.degree(i) as f64 * v[i] - neighbour_sum;
                shift * v[i] - laplacian
            })
            .collect()
    };

    let constant = vec![1.0 / (n as f64).sqrt(); n];
    let mut rng = StdRng::seed_from_u64(seed);
    let mut basis: Vec<Vec<f64>> = vec![constant];

    for _ in 0..2 {
        let mut v: Vec<f64> = (0..n).map(|_| rng.random::<f64>() - 0.5).collect();
        for _ in 0..300 {
            orthogonalize(&mut v, &basis);
            v = apply(&v);
            orthogonalize(&mut v, &basis);
            if !normalize(&mut v) {
                break;
            }
        }
        basis.push(v);
    }

    (0..n).map(|i| (basis[1][i], basis[2][i])).collect()
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let dot: f64 = v.iter().zip(b).map(|(x, y)| x * y).sum();
        for (x, y) in v.iter_mut().zip(b) {
            *x -= dot * y;
        }
    }
}

fn normalize(v: &mut [f64]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm < 1e-12 {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// Target coordinate range of a rescale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            x: (0.0, 1000.0),
            y: (0.0, 1000.0),
        }
    }
}

/// Linear interpolation of `value` from `old` into `new`. A degenerate old
/// range maps to the middle of the new one.
pub fn remap(value: f64, old: (f64, f64), new: (f64, f64)) -> f64 {
    let span = old.1 - old.0;
    if span.abs() < f64::EPSILON {
        return (new.0 + new.1) / 2.0;
    }
    new.0 + (value - old.0) * (new.1 - new.0) / span
}

/// Map raw positions onto `canvas`, using their own bounds as the old range.
pub fn rescale(positions: &[Position], canvas: Canvas) -> Vec<Position> {
    if positions.is_empty() {
        return Vec::new();
    }
    let bounds = |axis: fn(&Position) -> f64| {
        positions.iter().map(axis).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
    };
    let old_x = bounds(|p| p.0);
    let old_y = bounds(|p| p.1);
    positions
        .iter()
        .map(|&(x, y)| (remap(x, old_x, canvas.x), remap(y, old_y, canvas.y)))
        .collect()
}
