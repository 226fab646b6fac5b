mod support;

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use stipplecsg::stipple::{
    Configuration, DitheringMethod, DotGenerationWorker, EntityConfiguration, EntityLayer,
    PixelClassifier, Rect, SpriteSheet, StippleDot, StippleJob, StippleResult, TilingCompositor,
};

use crate::support::column_band;

const WIDTH: u32 = 40;
const HEIGHT: u32 = 30;
const SPRITE: (u32, u32) = (3, 3);

/// Dark photo on the left half, light on the right, with an entity
/// covering columns 10 to 29.
fn job() -> StippleJob {
    let rendering = column_band(WIDTH, HEIGHT, 10..30);
    StippleJob {
        source: RgbImage::from_fn(WIDTH, HEIGHT, |x, _| {
            if x < 20 { Rgb([30, 30, 30]) } else { Rgb([230, 230, 230]) }
        }),
        dithering: DitheringMethod::FloydSteinberg,
        scene_rendering: rendering.clone(),
        layers: vec![EntityLayer {
            name: "Prism 1".into(),
            rendering,
            configuration: EntityConfiguration::default(),
        }],
    }
}

fn configuration(dispersion: u32) -> Configuration {
    Configuration {
        rng_seed: 11,
        modelled_stippling_chance: 100,
        unmodelled_stippling_chance: 0,
        stipple_dot_dispersion: dispersion,
        ..Default::default()
    }
}

fn run(dispersion: u32) -> StippleResult {
    let classifier = PixelClassifier::new(configuration(dispersion), SPRITE, 1).expect("valid");
    DotGenerationWorker::spawn(classifier, job())
        .expect("spawned")
        .wait()
        .expect("finished")
}

fn dots(result: &StippleResult) -> Vec<StippleDot> {
    result.index.iter().copied().collect()
}

#[test]
fn dots_only_land_on_the_model() {
    let result = run(0);
    assert_eq!(result.canvas(), Rect::new(0, 0, WIDTH as i32, HEIGHT as i32));
    assert_eq!(result.dropped, 0);

    let dots = dots(&result);
    assert!(dots.len() > 150, "only {} dots", dots.len());
    for dot in &dots {
        assert!((10.0..30.0).contains(&dot.position.x), "dot at {:?}", dot.position);
        assert_eq!(dot.sprite, 0);
    }
    // the dark half of the model is far denser than the light half
    let dark = dots.iter().filter(|d| d.position.x < 20.0).count();
    assert!(dark > 2 * (dots.len() - dark));
}

#[test]
fn configured_dispersion_moves_interior_dots_only() {
    let still = dots(&run(0));
    let moved = run(30);
    assert_eq!(moved.index.len() + moved.dropped, still.len());

    let displaced: Vec<StippleDot> = moved.index.iter().copied().collect();
    assert!(displaced.iter().any(|d| d.final_position() != d.position));
    for dot in &displaced {
        let shift = dot.final_position() - dot.position;
        assert!(shift.x.abs() <= 3.0 && shift.y.abs() <= 3.0);
        if dot.silhouette {
            // no active override, so silhouette dots stay put
            assert_eq!(dot.final_position(), dot.position);
        }
    }
}

#[test]
fn tiled_export_covers_the_canvas() {
    let result = run(0);
    let sheet = SpriteSheet::new(vec![RgbaImage::from_pixel(SPRITE.0, SPRITE.1, Rgba([0, 0, 0, 255]))])
        .expect("sheet");
    let compositor = TilingCompositor::new(&result.index, &sheet);

    let image = compositor.export(16, 16).expect("export");
    assert_eq!(image.dimensions(), (WIDTH, HEIGHT));

    let white = Rgba([255, 255, 255, 255]);
    // nothing is drawn left of the model, sprites reach one pixel past it
    assert!((0..HEIGHT).all(|y| *image.get_pixel(5, y) == white));
    assert!(image.pixels().filter(|p| **p != white).count() > 150);

    // tile size does not change the picture
    assert_eq!(compositor.export(7, 5).expect("export"), image);
}

#[cfg(feature = "image-io")]
#[test]
fn png_written_to_disk() {
    let result = run(0);
    let sheet = SpriteSheet::new(vec![RgbaImage::from_pixel(SPRITE.0, SPRITE.1, Rgba([0, 0, 0, 255]))])
        .expect("sheet");
    let compositor = TilingCompositor::new(&result.index, &sheet);

    let path = support::scratch_path("stippled.png");
    compositor.save_png(&path, 16, 16).expect("saved");
    let loaded = image::open(&path).expect("decoded").to_rgba8();
    assert_eq!(loaded, compositor.export(16, 16).expect("export"));
}

#[test]
fn configuration_json_keeps_defaults_for_missing_fields() {
    let configuration = Configuration::from_json_str(r#"{ "packing_factor": 2, "rng_seed": 9 }"#)
        .expect("valid");
    assert_eq!(configuration.packing_factor, 2);
    assert_eq!(configuration.rng_seed, 9);
    assert_eq!(configuration.modelled_stippling_chance, 75);
    assert!(Configuration::from_json_str(r#"{ "packing_factor": 0 }"#).is_err());
}
