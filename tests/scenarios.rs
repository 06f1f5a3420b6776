mod common;

use common::{Op, RecordingBackend};
use mapheat::config::ViewConfig;
use mapheat::draw::{GridLayer, HoneycombLayer, IconLayer, TextLayer};
use mapheat::image_cache::ImageFetcher;
use mapheat::{
    Bitmap, DataPoint, DataSet, DrawMode, GridAggregator, HexBinAggregator, ImageCache, ImageState, IntensityConfig, IntensityMap,
    LayerConfig, Offset, PaintStyle, RenderConfig, Renderer, Rgba,
};
use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct CountingFetcher {
    fetched: Vec<String>,
}

impl ImageFetcher for CountingFetcher {
    fn fetch(&mut self, url: &str) {
        self.fetched.push(url.to_string());
    }
}

fn random_square(n: usize, side: f64, seed: u64) -> Vec<DataPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| DataPoint::point(rng.random_range(0.0..side), rng.random_range(0.0..side)))
        .collect()
}

fn pixel_config(layers: Vec<LayerConfig>) -> RenderConfig {
    RenderConfig {
        width: 100,
        height: 100,
        pixel_coordinates: true,
        layers,
        ..Default::default()
    }
}

#[test]
fn grid_over_a_thousand_points() {
    let points = random_square(1000, 1000.0, 7);
    let bins = GridAggregator::new(100.0, Offset::default()).aggregate(&points);
    assert!(bins.len() <= 100);
    assert_eq!(bins.total_count(), 1000.0);
    for bin in &bins {
        assert_eq!(bin.count, bin.members.len() as f64);
    }
}

#[test]
fn hexbins_keep_every_point() {
    let points = random_square(500, 300.0, 3);
    let aggregator = HexBinAggregator::new(20.0, Offset::new(3.0, -4.0));
    let bins = aggregator.aggregate(&points);
    assert_eq!(bins.total_count(), 500.0);
    let mut members = bins.iter().flat_map(|b| b.members.iter().copied()).collect::<Vec<_>>();
    members.sort_unstable();
    assert_eq!(members, (0..500).collect::<Vec<_>>());
}

#[test]
fn intensity_clamps_above_max() {
    let map = IntensityMap::new(&IntensityConfig::default());
    assert_eq!(map.color_for(150.0), map.color_for(100.0));
    assert_eq!(map.color_for(-5.0), map.color_for(0.0));
}

#[test]
fn grid_cells_rasterize_with_ramp_colors() {
    let points = vec![
        DataPoint::point(5.0, 5.0).with_count(100.0),
        DataPoint::point(15.0, 5.0).with_count(0.0),
    ];
    let bins = GridAggregator::new(10.0, Offset::default()).aggregate(&points);
    assert_eq!(bins.len(), 2);
    let intensity = IntensityMap::new(&IntensityConfig::default());

    let (w, h) = (20u32, 20u32);
    let mut buf = vec![255u8; (w * h * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        root.draw(&GridLayer::new(&bins, 10.0, &intensity, PaintStyle::default())).unwrap();
        root.present().unwrap();
    }
    let at = |x: u32, y: u32| {
        let i = ((y * w + x) * 3) as usize;
        (buf[i], buf[i + 1], buf[i + 2])
    };

    let (r, g, b) = at(5, 5);
    assert_eq!((r, b), (255, 0));
    assert!(g < 10);
    assert_eq!(at(15, 5), (0, 0, 255));
    assert_eq!(at(5, 15), (255, 255, 255));
}

#[test]
fn grid_labels_are_recorded() {
    let points = vec![DataPoint::point(5.0, 5.0).with_count(3.0), DataPoint::point(6.0, 6.0).with_count(4.9)];
    let bins = GridAggregator::new(10.0, Offset::default()).aggregate(&points);
    let intensity = IntensityMap::new(&IntensityConfig::default());

    let (root, recording) = RecordingBackend::area((20, 20));
    root.draw(&GridLayer::new(&bins, 10.0, &intensity, PaintStyle::default()).with_labels(Rgba::BLACK))
        .unwrap();

    let recording = recording.borrow();
    let fill = intensity.color_for(7.0);
    let rects = recording.filled_rects();
    assert_eq!(rects.len(), 1);
    assert_eq!((rects[0].0, rects[0].1), ((0, 0), (9, 9)));
    assert_eq!(rects[0].2.rgb, (fill.r, fill.g, fill.b));
    assert_eq!(recording.texts(), vec![("7".to_string(), (5, 5))]);
}

#[test]
fn honeycomb_draws_one_hexagon_per_bin() {
    let points = random_square(50, 100.0, 5);
    let aggregator = HexBinAggregator::new(10.0, Offset::default());
    let bins = aggregator.aggregate(&points);
    let intensity = IntensityMap::new(&IntensityConfig::default());

    let (root, recording) = RecordingBackend::area((100, 100));
    root.draw(&HoneycombLayer::new(&bins, &aggregator, &intensity, PaintStyle::default()).with_labels(Rgba::WHITE))
        .unwrap();

    let recording = recording.borrow();
    let polygons = recording.polygons();
    assert_eq!(polygons.len(), bins.len());
    assert!(polygons.iter().all(|p| p.len() == 6));
    let labelled = recording.texts().iter().map(|(t, _)| t.parse::<f64>().unwrap()).sum::<f64>();
    assert_eq!(labelled, 50.0);
}

#[test]
fn text_layer_writes_point_text() {
    let mut labelled = DataPoint::point(10.0, 20.0);
    labelled.text = Some("shibuya".to_string());
    let points = vec![labelled, DataPoint::point(30.0, 30.0)];

    let (root, recording) = RecordingBackend::area((50, 50));
    root.draw(&TextLayer::new(&points, PaintStyle::default(), Offset::new(0.0, -4.0))).unwrap();
    assert_eq!(recording.borrow().texts(), vec![("shibuya".to_string(), (10, 16))]);
}

#[test]
fn concurrent_icon_requests_share_one_fetch() {
    let mut cache = ImageCache::new();
    let mut fetcher = CountingFetcher::default();
    let seen = Rc::new(RefCell::new(Vec::new()));
    for caller in ["first", "second"] {
        let seen = Rc::clone(&seen);
        cache.request("pin.png", &mut fetcher, move |state| {
            seen.borrow_mut().push((caller, matches!(state, ImageState::Loaded(_))));
        });
    }
    assert_eq!(fetcher.fetched, vec!["pin.png".to_string()]);
    assert!(seen.borrow().is_empty());

    let bitmap = Bitmap::new(1, 1, vec![1, 2, 3, 255]).unwrap();
    assert_eq!(cache.resolve("pin.png", Ok(bitmap)), 2);
    assert_eq!(*seen.borrow(), vec![("first", true), ("second", true)]);
}

#[test]
fn failed_icons_fall_back_to_a_marker() {
    let mut cache = ImageCache::new();
    let mut fetcher = CountingFetcher::default();
    let mut broken = DataPoint::point(10.0, 10.0);
    broken.icon = Some("broken.png".to_string());
    let mut loading = DataPoint::point(20.0, 20.0);
    loading.icon = Some("slow.png".to_string());
    let mut loaded = DataPoint::point(30.0, 30.0);
    loaded.icon = Some("dot.png".to_string());
    let points = vec![broken, loading, loaded, DataPoint::point(40.0, 40.0)];

    assert_eq!(mapheat::draw::request_missing(&points, None, &mut cache, &mut fetcher), 3);
    cache.resolve("broken.png", Err(anyhow::anyhow!("404")));
    cache.resolve("dot.png", Bitmap::new(1, 1, vec![0, 0, 255, 255]));
    assert_eq!(mapheat::draw::request_missing(&points, None, &mut cache, &mut fetcher), 0);

    let (root, recording) = RecordingBackend::area((50, 50));
    root.draw(&IconLayer::new(&points, &cache, None, PaintStyle::default())).unwrap();

    let recording = recording.borrow();
    let circles = recording.circles();
    assert_eq!(circles.len(), 1);
    assert_eq!((circles[0].0, circles[0].1, circles[0].3), ((10, 10), 5, true));
    assert_eq!(recording.pixels.len(), 1);
    assert_eq!(recording.pixels[&(30, 30)].rgb, (0, 0, 255));
}

#[test]
fn renderer_draws_background_then_layers() {
    let points = vec![DataPoint::point(50.0, 50.0).with_count(100.0), DataPoint::point(70.0, 20.0).with_count(100.0)];
    let data = DataSet::new(points);
    let config = pixel_config(vec![LayerConfig::new(DrawMode::Heatmap), LayerConfig::new(DrawMode::Simple)]);

    let (root, recording) = RecordingBackend::area((100, 100));
    Renderer::new().render(&root, &config, &data, &ImageCache::new()).unwrap();

    let recording = recording.borrow();
    match &recording.ops[0] {
        Op::Rect { upper_left, color, fill, .. } => {
            assert_eq!(*upper_left, (0, 0));
            assert_eq!(color.rgb, (255, 255, 255));
            assert!(*fill);
        }
        op => panic!("expected the background first, got {op:?}"),
    }
    let centers = recording.circles().iter().map(|c| c.0).collect::<Vec<_>>();
    assert_eq!(centers, vec![(50, 50), (70, 20)]);

    let hot = recording.pixels[&(50, 50)];
    assert!(hot.alpha > 0.7 && hot.alpha <= 0.81);
    assert!(!recording.pixels.contains_key(&(0, 99)));
}

#[test]
fn renderer_clusters_nearby_points() {
    let center = [139.7, 35.7];
    let data = DataSet::new(vec![
        DataPoint::point(center[0], center[1]),
        DataPoint::point(center[0] + 0.0001, center[1]),
        DataPoint::point(center[0] - 0.0001, center[1]),
        DataPoint::point(center[0] + 1.0, center[1]),
    ]);
    let mut layer = LayerConfig::new(DrawMode::Cluster);
    layer.label = Some(Rgba::BLACK);
    let config = RenderConfig {
        width: 200,
        height: 200,
        view: Some(ViewConfig { center, zoom: 10.0 }),
        layers: vec![layer],
        ..Default::default()
    };

    let (root, recording) = RecordingBackend::area((200, 200));
    Renderer::new().render(&root, &config, &data, &ImageCache::new()).unwrap();

    let recording = recording.borrow();
    let circles = recording.circles();
    assert_eq!(circles.len(), 1);
    let ((x, y), radius, _, _) = circles[0];
    assert!((x - 100).abs() <= 1 && (y - 100).abs() <= 1);
    assert_eq!(radius, 30);
    assert_eq!(recording.texts().iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>(), vec!["3"]);
}

#[test]
fn cluster_layer_without_geography_is_skipped() {
    let data = DataSet::new(vec![DataPoint::point(10.0, 10.0)]);
    let config = pixel_config(vec![LayerConfig::new(DrawMode::Cluster)]);

    let (root, recording) = RecordingBackend::area((100, 100));
    Renderer::new().render(&root, &config, &data, &ImageCache::new()).unwrap();
    assert_eq!(recording.borrow().ops.len(), 1);
}

#[test]
fn category_layer_colors_by_count() {
    let data = DataSet::new(vec![DataPoint::point(10.0, 10.0).with_count(1.0), DataPoint::point(20.0, 20.0).with_count(2.0)]);
    let mut layer = LayerConfig::new(DrawMode::Category);
    layer.categories.insert("2".to_string(), Rgba::opaque(0, 128, 0));
    let config = pixel_config(vec![layer]);

    let (root, recording) = RecordingBackend::area((100, 100));
    Renderer::new().render(&root, &config, &data, &ImageCache::new()).unwrap();

    let colors = recording.borrow().circles().iter().map(|c| c.2.rgb).collect::<Vec<_>>();
    assert_eq!(colors[1], (0, 128, 0));
    assert_ne!(colors[0], (0, 128, 0));
}

#[test]
fn heatmap_follows_the_backend_size() {
    let data = DataSet::new(vec![DataPoint::point(50.0, 50.0).with_count(100.0), DataPoint::point(150.0, 150.0).with_count(100.0)]);
    let config = RenderConfig {
        width: 200,
        height: 200,
        ..pixel_config(vec![LayerConfig::new(DrawMode::Heatmap)])
    };

    let (root, recording) = RecordingBackend::area((100, 100));
    Renderer::new().render(&root, &config, &data, &ImageCache::new()).unwrap();

    let recording = recording.borrow();
    assert!(recording.pixels.contains_key(&(50, 50)));
    assert!(recording.pixels.keys().all(|&(x, y)| (0..100).contains(&x) && (0..100).contains(&y)));
}
