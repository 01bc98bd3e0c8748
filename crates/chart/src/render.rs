//! Pure draw-command production.
//!
//! No hidden state and no I/O: rendering the same series twice yields
//! identical command lists. Colors and geometry follow the live chart
//! look: a subtle blue price trace over a gradient area, and a prominent
//! orange oscillating trace when a prediction overlay is present.

use serde::{Deserialize, Serialize};

use trendcast_core::{PredictionResult, PriceSeries};

/// Headroom under the window minimum when scaling the price axis.
const MIN_PADDING: f64 = 0.99;
/// Headroom over the window maximum.
const MAX_PADDING: f64 = 1.01;
/// Amplitude of the overlay oscillation, as a fraction of the price range.
const OVERLAY_AMPLITUDE: f64 = 0.03;
/// Number of price labels on the right edge.
const PRICE_LABELS: usize = 6;

/// Target surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 250.0,
        }
    }
}

/// A point in surface coordinates (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// One cubic bezier segment of a smoothed path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSegment {
    pub control1: ScreenPoint,
    pub control2: ScreenPoint,
    pub to: ScreenPoint,
}

/// A vertical gradient stop: offset in [0, 1] plus a CSS color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

/// Drop shadow parameters for a stroked path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// One primitive for the drawing adapter to issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Fill the whole surface with a background color.
    Background { color: String },
    /// Right-aligned price label on the axis.
    PriceLabel { text: String, x: f64, y: f64 },
    /// Polygon under a trace, filled with a vertical gradient. The
    /// polygon runs along `points` and closes along the bottom edge.
    AreaFill {
        points: Vec<ScreenPoint>,
        gradient: Vec<GradientStop>,
    },
    /// Smoothed trace.
    CurvePath {
        start: ScreenPoint,
        segments: Vec<CurveSegment>,
        stroke_color: String,
        stroke_width: f64,
        shadow: Option<Shadow>,
    },
}

/// Renders a series (and an optional prediction overlay) into draw
/// commands for a surface of the given viewport.
#[must_use]
pub fn render(
    series: &PriceSeries,
    overlay: Option<&PredictionResult>,
    viewport: Viewport,
) -> Vec<DrawCommand> {
    let mut commands = vec![DrawCommand::Background {
        color: "#0a0e17".to_string(),
    }];

    if series.is_empty() {
        return commands;
    }

    let prices = series.prices();
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min) * MIN_PADDING;
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max) * MAX_PADDING;
    let price_range = if max_price > min_price {
        max_price - min_price
    } else {
        1.0
    };

    let scale = Scale {
        min_price,
        price_range,
        count: prices.len(),
        viewport,
    };

    for i in 0..PRICE_LABELS {
        let y = viewport.height - i as f64 * (viewport.height / (PRICE_LABELS - 1) as f64);
        let price = min_price + (i as f64 / (PRICE_LABELS - 1) as f64) * price_range;
        commands.push(DrawCommand::PriceLabel {
            text: format!("{price:.1}"),
            x: viewport.width - 5.0,
            y: y - 5.0,
        });
    }

    let base_points: Vec<ScreenPoint> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| scale.project(i, *price))
        .collect();

    commands.push(DrawCommand::AreaFill {
        points: base_points.clone(),
        gradient: vec![
            stop(0.0, "rgba(91, 192, 222, 0.08)"),
            stop(0.5, "rgba(91, 192, 222, 0.04)"),
            stop(1.0, "rgba(91, 192, 222, 0)"),
        ],
    });
    commands.push(curve_path(
        &base_points,
        "rgba(91, 192, 222, 0.5)",
        1.5,
        Some(Shadow {
            color: "rgba(91, 192, 222, 0.2)".to_string(),
            blur: 3.0,
            offset_x: 0.0,
            offset_y: 1.0,
        }),
    ));

    if overlay.is_some() {
        // The prediction trace rides a fixed-frequency oscillation around
        // the live trace so the two stay visually distinct.
        let overlay_points: Vec<ScreenPoint> = prices
            .iter()
            .enumerate()
            .map(|(i, price)| {
                let wobble = (i as f64 * 0.5).sin() * OVERLAY_AMPLITUDE * price_range;
                scale.project(i, *price + wobble)
            })
            .collect();

        commands.push(DrawCommand::AreaFill {
            points: overlay_points.clone(),
            gradient: vec![
                stop(0.0, "rgba(255, 150, 50, 0.2)"),
                stop(0.5, "rgba(255, 150, 50, 0.1)"),
                stop(1.0, "rgba(255, 150, 50, 0)"),
            ],
        });
        commands.push(curve_path(
            &overlay_points,
            "#ff9632",
            3.5,
            Some(Shadow {
                color: "rgba(255, 150, 50, 0.8)".to_string(),
                blur: 12.0,
                offset_x: 0.0,
                offset_y: 4.0,
            }),
        ));
    }

    commands
}

struct Scale {
    min_price: f64,
    price_range: f64,
    count: usize,
    viewport: Viewport,
}

impl Scale {
    /// Linear projection of (index, price) into surface coordinates.
    fn project(&self, index: usize, price: f64) -> ScreenPoint {
        let span = (self.count.saturating_sub(1)).max(1) as f64;
        let x = index as f64 / span * self.viewport.width;
        let y = self.viewport.height
            - ((price - self.min_price) / self.price_range) * self.viewport.height;
        ScreenPoint { x, y }
    }
}

fn stop(offset: f64, color: &str) -> GradientStop {
    GradientStop {
        offset,
        color: color.to_string(),
    }
}

/// Builds a bezier-smoothed path through `points`, control points at 1/3
/// and 2/3 of each horizontal span.
fn curve_path(
    points: &[ScreenPoint],
    stroke_color: &str,
    stroke_width: f64,
    shadow: Option<Shadow>,
) -> DrawCommand {
    let start = points[0];
    let segments = points
        .windows(2)
        .map(|pair| {
            let (prev, next) = (pair[0], pair[1]);
            let dx = next.x - prev.x;
            CurveSegment {
                control1: ScreenPoint {
                    x: prev.x + dx / 3.0,
                    y: prev.y,
                },
                control2: ScreenPoint {
                    x: prev.x + 2.0 * dx / 3.0,
                    y: next.y,
                },
                to: next,
            }
        })
        .collect();

    DrawCommand::CurvePath {
        start,
        segments,
        stroke_color: stroke_color.to_string(),
        stroke_width,
        shadow,
    }
}
