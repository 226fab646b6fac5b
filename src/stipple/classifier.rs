//! Per-pixel dot placement guided by the rendered CSG scene.
//!
//! Every pixel of the dithered photo consumes the seeded random sequence in
//! raster order. A dark pixel covered by an entity is stippled with the
//! modelled chance, or always when it lies on a detected edge. A dark pixel
//! outside the model is stippled with the unmodelled chance. The topmost
//! covering entity with its own configuration may override the interior
//! chance, the edge mask and the silhouette dispersion.

use crate::errors::StippleError;
use crate::float_types::Real;
use crate::stipple::config::{Configuration, EntityConfiguration};
use crate::stipple::dither::{DitheringMethod, dither};
use crate::stipple::dot::{StippleDot, apply_dispersion};
use crate::stipple::edges::detect_edges;
use crate::stipple::quadtree::{Rect, SpatialIndex};
use crate::stipple::rng::StippleRng;
use image::{GrayImage, Rgb, RgbImage};
use nalgebra::{Point2, Vector2};
use tracing::{debug, info, instrument};

/// Colour marking pixels an entity rendering does not cover.
pub const BACKGROUND_MARKER: Rgb<u8> = Rgb([255, 0, 0]);

/// Largest dithered value still counted as dark.
pub const DARK_THRESHOLD: u8 = 128;

/// Levels of the spatial index below its root.
pub const INDEX_DEPTH: u32 = 5;

/// One entity's solid rendering with its stippling overrides.
#[derive(Debug, Clone)]
pub struct EntityLayer {
    pub name: String,
    /// Entity colour on [`BACKGROUND_MARKER`], same size as the photo.
    pub rendering: RgbImage,
    pub configuration: EntityConfiguration,
}

/// Everything a synthesis pass starts from.
#[derive(Debug, Clone)]
pub struct StippleJob {
    pub source: RgbImage,
    pub dithering: DitheringMethod,
    /// Solid rendering of the whole scene, used for the global edge mask.
    pub scene_rendering: RgbImage,
    /// Entity layers in breadth-first tree order, topmost last.
    pub layers: Vec<EntityLayer>,
}

/// A layer ready for classification.
#[derive(Debug, Clone)]
pub struct PreparedLayer {
    pub name: String,
    pub rendering: RgbImage,
    pub configuration: EntityConfiguration,
    /// Edge mask of this layer alone, present when the configuration
    /// overrides anything.
    pub edges: Option<GrayImage>,
}

impl PreparedLayer {
    pub fn covers(&self, column: u32, row: u32) -> bool {
        self.rendering
            .get_pixel_checked(column, row)
            .is_some_and(|p| *p != BACKGROUND_MARKER)
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierInputs {
    pub dithered: GrayImage,
    /// Edge mask of the whole scene; `None` means no edges.
    pub edges: Option<GrayImage>,
    pub layers: Vec<PreparedLayer>,
}

impl ClassifierInputs {
    /// `(rows, columns)` of the photo.
    pub fn image_size(&self) -> (u32, u32) {
        (self.dithered.height(), self.dithered.width())
    }
}

/// Placed dots of one pass.
#[derive(Debug, Clone)]
pub struct StippleResult {
    pub index: SpatialIndex,
    /// Dots that fell outside the canvas after dispersion.
    pub dropped: usize,
}

impl StippleResult {
    pub fn canvas(&self) -> Rect {
        self.index.root_area()
    }

    /// Re-randomize every dot's offset and rebuild the index from scratch.
    pub fn redisperse(&mut self, dispersion: u32, seed: u32) {
        let area = self.index.root_area();
        let depth = self.index.depth();
        let mut dots = std::mem::replace(&mut self.index, SpatialIndex::new(area, 0)).into_dots();
        apply_dispersion(&mut dots, dispersion, seed);

        let mut index = SpatialIndex::new(area, depth);
        self.dropped = dots.into_iter().filter(|&dot| index.insert(dot).is_err()).count();
        self.index = index;
        debug!(dots = self.index.len(), dropped = self.dropped, "dispersion applied");
    }
}

/// The decision procedure with its global parameters.
#[derive(Debug, Clone)]
pub struct PixelClassifier {
    configuration: Configuration,
    sprite_size: (u32, u32),
    sprite_count: u32,
}

impl PixelClassifier {
    pub fn new(
        configuration: Configuration,
        sprite_size: (u32, u32),
        sprite_count: u32,
    ) -> Result<Self, StippleError> {
        configuration.validate()?;
        if sprite_count == 0 || sprite_size.0 == 0 || sprite_size.1 == 0 {
            return Err(StippleError::EmptySpriteSheet);
        }
        Ok(PixelClassifier {
            configuration,
            sprite_size,
            sprite_count,
        })
    }

    pub const fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Canvas covered by the dots of an image of `rows × columns` pixels.
    pub const fn canvas(&self, rows: u32, columns: u32) -> Rect {
        let packing = self.configuration.packing_factor;
        let height = rows.saturating_mul(self.sprite_size.1) / packing;
        let width = columns.saturating_mul(self.sprite_size.0) / packing;
        Rect {
            x0: 0,
            y0: 0,
            x1: width as i32,
            y1: height as i32,
        }
    }

    /// Dither the photo and compute the global and per-layer edge masks.
    #[instrument(skip_all, fields(layers = job.layers.len()))]
    pub fn prepare(&self, job: StippleJob) -> Result<ClassifierInputs, StippleError> {
        let expected = job.source.dimensions();
        let check = |found: (u32, u32)| {
            if found == expected {
                Ok(())
            } else {
                Err(StippleError::ImageSizeMismatch { expected, found })
            }
        };
        check(job.scene_rendering.dimensions())?;
        for layer in &job.layers {
            check(layer.rendering.dimensions())?;
        }

        let dithered = dither(&job.source, job.dithering);
        info!(method = ?job.dithering, "dithered image created");

        let global_method = self.configuration.edge_detection_method;
        let edges = Some(detect_edges(&job.scene_rendering, global_method));
        let layers = job
            .layers
            .into_iter()
            .map(|layer| {
                let edges = (!layer.configuration.is_default()).then(|| {
                    let method = if layer.configuration.has_specific_edge_detection {
                        layer.configuration.edge_detection_method
                    } else {
                        global_method
                    };
                    detect_edges(&layer.rendering, method)
                });
                PreparedLayer {
                    name: layer.name,
                    rendering: layer.rendering,
                    configuration: layer.configuration,
                    edges,
                }
            })
            .collect();
        info!("edge detection completed");

        Ok(ClassifierInputs {
            dithered,
            edges,
            layers,
        })
    }

    /// Classify every pixel in raster order and index the placed dots.
    ///
    /// `progress` receives 10, 20, … 100 as the pass advances.
    #[instrument(skip_all)]
    pub fn classify(&self, inputs: &ClassifierInputs, mut progress: impl FnMut(u32)) -> StippleResult {
        let (rows, columns) = inputs.image_size();
        let canvas = self.canvas(rows, columns);
        info!(rows, columns, ?canvas, packing = self.configuration.packing_factor, "beginning dot creation");

        let mut index = SpatialIndex::new(canvas, INDEX_DEPTH);
        let mut rng = StippleRng::new(self.configuration.rng_seed);
        let mut dropped = 0;
        let total = u64::from(rows) * u64::from(columns);
        let mut last_progress = 0;

        for row in 0..rows {
            for column in 0..columns {
                if let Some(dot) = self.classify_pixel(inputs, canvas, row, column, &mut rng) {
                    // fractional positions can fall just past the truncated canvas
                    if index.insert(dot).is_err() {
                        dropped += 1;
                    }
                }

                let done = u64::from(row) * u64::from(columns) + u64::from(column) + 1;
                let percent = (100 * done / total) as u32;
                while percent >= last_progress + 10 {
                    last_progress += 10;
                    info!(progress = last_progress, "stippling");
                    progress(last_progress);
                }
            }
        }

        info!(dots = index.len(), "dot creation finished");
        StippleResult { index, dropped }
    }

    /// Decide a single pixel, advancing `rng` exactly as a full pass would.
    pub fn classify_pixel(
        &self,
        inputs: &ClassifierInputs,
        canvas: Rect,
        row: u32,
        column: u32,
        rng: &mut StippleRng,
    ) -> Option<StippleDot> {
        let config = &self.configuration;
        let sprite = rng.below(self.sprite_count - 1);

        let mut covered = false;
        let mut active: Option<&PreparedLayer> = None;
        for layer in inputs.layers.iter().rev() {
            if layer.covers(column, row) {
                covered = true;
                if !layer.configuration.is_default() {
                    active = Some(layer);
                    break;
                }
            }
        }

        let dark = inputs
            .dithered
            .get_pixel_checked(column, row)
            .is_some_and(|p| p[0] <= DARK_THRESHOLD);
        let belongs_to_model = dark && covered;

        let mut place = false;
        if !belongs_to_model {
            let roll = rng.below(100);
            place = dark && roll >= 100 - config.unmodelled_stippling_chance;
        }

        let mask = match active {
            Some(layer) => layer.edges.as_ref(),
            None => inputs.edges.as_ref(),
        };
        let is_edge = mask
            .and_then(|m| m.get_pixel_checked(column, row))
            .is_some_and(|p| p[0] != 0);

        if belongs_to_model {
            let roll = rng.below(100) as i32;
            place = if is_edge {
                true
            } else {
                match active.map(|layer| layer.configuration.internal_generation) {
                    Some(internal) if internal != EntityConfiguration::UNSET => roll > 100 - internal,
                    _ => roll >= 100 - config.modelled_stippling_chance as i32,
                }
            };
        }

        if !place {
            return None;
        }

        let (sprite_w, sprite_h) = (self.sprite_size.0 as Real, self.sprite_size.1 as Real);
        let packing = config.packing_factor as Real;
        let position = Point2::new(
            column as Real * sprite_w / packing,
            canvas.y1 as Real - row as Real * sprite_h / packing,
        );
        let mut dot = StippleDot::new(position, Vector2::new(sprite_w, sprite_h), sprite);
        dot.silhouette = is_edge;
        dot.can_have_offset_applied = if is_edge {
            active.is_some_and(|layer| {
                rng.below(100) as i32 > 100 - layer.configuration.silhouette_dispersion
            })
        } else {
            true
        };
        Some(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stipple::edges::EdgeDetectionMethod;
    use image::Luma;

    const COVERED: Rgb<u8> = Rgb([0, 255, 0]);

    fn classifier(modelled: u32, unmodelled: u32) -> PixelClassifier {
        let configuration = Configuration {
            packing_factor: 1,
            modelled_stippling_chance: modelled,
            unmodelled_stippling_chance: unmodelled,
            ..Default::default()
        };
        PixelClassifier::new(configuration, (1, 1), 4).expect("valid classifier")
    }

    fn layer(rendering: RgbImage, configuration: EntityConfiguration) -> PreparedLayer {
        PreparedLayer {
            name: "entity".into(),
            rendering,
            configuration,
            edges: None,
        }
    }

    fn dark_inputs(size: u32, layers: Vec<PreparedLayer>) -> ClassifierInputs {
        ClassifierInputs {
            dithered: GrayImage::from_pixel(size, size, Luma([0])),
            edges: Some(GrayImage::new(size, size)),
            layers,
        }
    }

    #[test]
    fn covered_dark_pixels_all_place_at_full_chance() {
        let inputs = dark_inputs(
            4,
            vec![layer(RgbImage::from_pixel(4, 4, COVERED), EntityConfiguration::default())],
        );
        let result = classifier(100, 0).classify(&inputs, |_| {});
        assert_eq!(result.index.len(), 16);
        assert!(result.index.iter().all(|d| !d.silhouette && d.can_have_offset_applied));
    }

    #[test]
    fn zero_chances_place_nothing() {
        let inputs = dark_inputs(
            4,
            vec![layer(RgbImage::from_pixel(4, 4, COVERED), EntityConfiguration::default())],
        );
        assert!(classifier(0, 0).classify(&inputs, |_| {}).index.is_empty());
    }

    #[test]
    fn edge_pixels_are_always_stippled_and_fixed() {
        let mut inputs = dark_inputs(
            4,
            vec![layer(RgbImage::from_pixel(4, 4, COVERED), EntityConfiguration::default())],
        );
        inputs.edges = Some(GrayImage::from_pixel(4, 4, Luma([255])));
        let result = classifier(0, 0).classify(&inputs, |_| {});
        assert_eq!(result.index.len(), 16);
        assert!(result.index.iter().all(|d| d.silhouette && !d.can_have_offset_applied));
    }

    #[test]
    fn uncovered_pixels_use_unmodelled_chance() {
        let background = RgbImage::from_pixel(4, 4, BACKGROUND_MARKER);
        let inputs = dark_inputs(4, vec![layer(background, EntityConfiguration::default())]);
        assert_eq!(classifier(100, 100).classify(&inputs, |_| {}).index.len(), 16);
        assert!(classifier(100, 0).classify(&inputs, |_| {}).index.is_empty());
    }

    #[test]
    fn topmost_override_wins() {
        let full = RgbImage::from_pixel(4, 4, COVERED);
        let bottom = layer(full.clone(), EntityConfiguration::default());
        let top = layer(
            full,
            EntityConfiguration {
                internal_generation: 0,
                ..Default::default()
            },
        );
        // top layer has its own empty edge mask and forbids interior dots
        let mut top = top;
        top.edges = Some(GrayImage::new(4, 4));
        let inputs = dark_inputs(4, vec![bottom, top]);
        assert!(classifier(100, 0).classify(&inputs, |_| {}).index.is_empty());
    }

    fn overriding_layer(configuration: EntityConfiguration, edges: u8) -> PreparedLayer {
        let mut top = layer(RgbImage::from_pixel(8, 8, COVERED), configuration);
        top.edges = Some(GrayImage::from_pixel(8, 8, Luma([edges])));
        top
    }

    #[test]
    fn silhouette_dispersion_frees_entity_edge_dots() {
        let top = overriding_layer(
            EntityConfiguration {
                silhouette_dispersion: 100,
                ..Default::default()
            },
            255,
        );
        // the scene mask has no edges, only the entity mask does
        let inputs = dark_inputs(8, vec![top]);
        let result = classifier(0, 0).classify(&inputs, |_| {});
        assert_eq!(result.index.len(), 64);
        assert!(result.index.iter().all(|d| d.silhouette));
        // a roll of 0 is the only one that keeps a dot fixed
        let free = result.index.iter().filter(|d| d.can_have_offset_applied).count();
        assert!(free >= 58, "only {free} of 64 edge dots may move");
    }

    #[test]
    fn entity_edge_mask_replaces_scene_mask() {
        let specific = EntityConfiguration {
            has_specific_edge_detection: true,
            edge_detection_method: EdgeDetectionMethod::Canny,
            ..Default::default()
        };

        let inputs = dark_inputs(8, vec![overriding_layer(specific, 255)]);
        let result = classifier(0, 0).classify(&inputs, |_| {});
        assert_eq!(result.index.len(), 64);
        assert!(result.index.iter().all(|d| d.silhouette && !d.can_have_offset_applied));

        let mut inputs = dark_inputs(8, vec![overriding_layer(specific, 0)]);
        inputs.edges = Some(GrayImage::from_pixel(8, 8, Luma([255])));
        assert!(classifier(0, 0).classify(&inputs, |_| {}).index.is_empty());
    }

    #[test]
    fn positions_flip_rows_and_scale_by_sprite() {
        let configuration = Configuration {
            packing_factor: 2,
            modelled_stippling_chance: 100,
            ..Default::default()
        };
        let classifier = PixelClassifier::new(configuration, (4, 6), 2).expect("valid");
        let inputs = dark_inputs(
            2,
            vec![layer(RgbImage::from_pixel(2, 2, COVERED), EntityConfiguration::default())],
        );
        let canvas = classifier.canvas(2, 2);
        assert_eq!(canvas, Rect::new(0, 0, 4, 6));

        let mut rng = StippleRng::new(0);
        let dot = classifier
            .classify_pixel(&inputs, canvas, 1, 1, &mut rng)
            .expect("placed");
        assert_eq!(dot.position, Point2::new(2.0, 3.0));
        assert_eq!(dot.size, Vector2::new(4.0, 6.0));
        assert_eq!(dot.sprite, 0);
    }

    #[test]
    fn passes_are_deterministic_and_report_progress() {
        let inputs = ClassifierInputs {
            dithered: GrayImage::from_fn(20, 10, |x, y| Luma([if (x + y) % 3 == 0 { 255 } else { 0 }])),
            edges: Some(GrayImage::from_fn(20, 10, |x, _| Luma([if x == 10 { 255 } else { 0 }]))),
            layers: vec![layer(
                RgbImage::from_fn(20, 10, |x, _| if x < 12 { COVERED } else { BACKGROUND_MARKER }),
                EntityConfiguration::default(),
            )],
        };
        let classifier = classifier(60, 20);
        let mut steps = Vec::new();
        let first = classifier.classify(&inputs, |p| steps.push(p));
        let second = classifier.classify(&inputs, |_| {});

        assert_eq!(steps, (1..=10).map(|k| k * 10).collect::<Vec<_>>());
        let a: Vec<StippleDot> = first.index.iter().copied().collect();
        let b: Vec<StippleDot> = second.index.iter().copied().collect();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn prepare_rejects_mismatched_layers() {
        let classifier = classifier(50, 10);
        let job = StippleJob {
            source: RgbImage::new(4, 4),
            dithering: DitheringMethod::FloydSteinberg,
            scene_rendering: RgbImage::new(4, 4),
            layers: vec![EntityLayer {
                name: "small".into(),
                rendering: RgbImage::new(2, 2),
                configuration: EntityConfiguration::default(),
            }],
        };
        assert!(matches!(
            classifier.prepare(job),
            Err(StippleError::ImageSizeMismatch { expected: (4, 4), found: (2, 2) })
        ));
    }

    #[test]
    fn prepare_builds_masks_for_overridden_layers_only() {
        let classifier = classifier(50, 10);
        let rendering = RgbImage::from_fn(6, 6, |x, _| if x < 3 { COVERED } else { BACKGROUND_MARKER });
        let job = StippleJob {
            source: RgbImage::new(6, 6),
            dithering: DitheringMethod::Stucki,
            scene_rendering: rendering.clone(),
            layers: vec![
                EntityLayer {
                    name: "plain".into(),
                    rendering: rendering.clone(),
                    configuration: EntityConfiguration::default(),
                },
                EntityLayer {
                    name: "custom".into(),
                    rendering,
                    configuration: EntityConfiguration {
                        silhouette_dispersion: 30,
                        ..Default::default()
                    },
                },
            ],
        };
        let inputs = classifier.prepare(job).expect("prepared");
        assert!(inputs.layers[0].edges.is_none());
        assert!(inputs.layers[1].edges.is_some());
        assert!(inputs.dithered.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn redisperse_moves_only_eligible_dots() {
        let inputs = dark_inputs(
            8,
            vec![layer(RgbImage::from_pixel(8, 8, COVERED), EntityConfiguration::default())],
        );
        let mut result = classifier(100, 0).classify(&inputs, |_| {});
        let before = result.index.len();
        result.redisperse(30, 5);
        assert_eq!(result.index.len() + result.dropped, before);
        assert!(result.index.iter().any(|d| d.offset != Vector2::zeros()));
    }
}
