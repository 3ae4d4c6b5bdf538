//! End-to-end tests for the map pipeline with a scripted HTTP client.
//!
//! No network access: every provider is answered by `ScriptedClient`.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;

use shiptracker::cache::{ManualClock, TileCache, DEFAULT_CACHE_DURATION};
use shiptracker::coord::GeoPosition;
use shiptracker::display::DisplayAssembler;
use shiptracker::map::{MapRenderer, MapSource, TargetSize, MARKER_RADIUS, UNAVAILABLE_TEXT};
use shiptracker::provider::{
    AsyncHttpClient, MapProvider, ProviderChain, ProviderError, ProviderList, TileFetcher,
};
use shiptracker::vessel::VesselData;

/// Answers by host name and records every URL in order.
struct ScriptedClient {
    failing_hosts: Vec<&'static str>,
    tile: Bytes,
    log: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(failing_hosts: Vec<&'static str>) -> Self {
        Self {
            failing_hosts,
            tile: Bytes::from(street_tile()),
            log: Mutex::new(Vec::new()),
        }
    }

    fn hosts_in_order(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();
        for url in self.log.lock().iter() {
            let host = url
                .trim_start_matches("https://")
                .split('/')
                .next()
                .unwrap_or_default()
                .to_string();
            if hosts.last() != Some(&host) {
                hosts.push(host);
            }
        }
        hosts
    }

    fn count(&self, host: &str) -> usize {
        self.log.lock().iter().filter(|u| u.contains(host)).count()
    }
}

impl AsyncHttpClient for ScriptedClient {
    async fn get(&self, url: &str) -> Result<Bytes, ProviderError> {
        self.log.lock().push(url.to_string());
        if self.failing_hosts.iter().any(|h| url.contains(h)) {
            return Err(ProviderError::HttpStatus {
                status: 500,
                url: url.to_string(),
            });
        }
        Ok(self.tile.clone())
    }
}

/// A 256×256 tile with a light background and dark "streets".
fn street_tile() -> Vec<u8> {
    let img = RgbaImage::from_fn(256, 256, |x, y| {
        if x % 32 < 3 || y % 48 < 4 {
            Rgba([60, 60, 60, 255])
        } else {
            Rgba([235, 230, 220, 255])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn providers() -> ProviderList {
    ProviderList::new(vec![
        MapProvider::new("one", "https://one.tiles.test/{z}/{x}/{y}.png").unwrap(),
        MapProvider::new("two", "https://two.tiles.test/{z}/{x}/{y}.png").unwrap(),
        MapProvider::new("three", "https://three.tiles.test/{z}/{x}/{y}.png").unwrap(),
    ])
    .unwrap()
}

fn renderer(
    client: Arc<ScriptedClient>,
    cache: Arc<TileCache>,
) -> MapRenderer<ScriptedClient> {
    let fetcher = TileFetcher::new(client, cache);
    MapRenderer::new(ProviderChain::new(providers(), fetcher).with_zoom(9))
}

fn ship() -> GeoPosition {
    GeoPosition::new(62.8568, 58.7332).unwrap()
}

#[tokio::test]
async fn test_first_provider_500_second_serves_map() {
    let client = Arc::new(ScriptedClient::new(vec!["one.tiles.test"]));
    let cache = Arc::new(TileCache::new(DEFAULT_CACHE_DURATION));
    let renderer = renderer(Arc::clone(&client), cache);

    let map = renderer.render(ship(), TargetSize::new(400, 420)).await;

    assert_eq!((map.width(), map.height()), (400, 420));
    assert_eq!(map.source, MapSource::Provider("two".to_string()));
    assert!(map.annotations.is_empty(), "no placeholder text expected");

    let (mx, my) = map.marker.expect("marker drawn");
    assert!(mx < 400 && my < 420);
    assert!(map.bitmap.is_black(mx + MARKER_RADIUS, my), "marker ring is inked");

    assert_eq!(client.hosts_in_order(), vec!["one.tiles.test", "two.tiles.test"]);
    assert_eq!(client.count("three.tiles.test"), 0);
    assert_eq!(map.attempts.len(), 2);
    assert!(!map.attempts[0].succeeded());
    assert!(map.attempts[1].succeeded());
}

#[tokio::test]
async fn test_every_provider_failing_yields_placeholder() {
    let client = Arc::new(ScriptedClient::new(vec![
        "one.tiles.test",
        "two.tiles.test",
        "three.tiles.test",
    ]));
    let renderer = renderer(
        Arc::clone(&client),
        Arc::new(TileCache::new(DEFAULT_CACHE_DURATION)),
    );

    let map = renderer.render(ship(), TargetSize::new(400, 420)).await;

    assert_eq!((map.width(), map.height()), (400, 420));
    assert!(map.is_fallback());
    assert_eq!(map.annotations[0], UNAVAILABLE_TEXT);
    assert!(map.annotations[1].contains("62.8568°"));
    assert!(map.annotations[1].contains("58.7332°"));
    assert_eq!(
        client.hosts_in_order(),
        vec!["one.tiles.test", "two.tiles.test", "three.tiles.test"]
    );
}

#[tokio::test]
async fn test_polar_ship_yields_placeholder_without_network() {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let renderer = renderer(
        Arc::clone(&client),
        Arc::new(TileCache::new(DEFAULT_CACHE_DURATION)),
    );

    let position = GeoPosition::new(85.06, 0.0).unwrap();
    let map = renderer.render(position, TargetSize::new(200, 100)).await;

    assert!(map.is_fallback());
    assert_eq!((map.width(), map.height()), (200, 100));
    assert!(client.log.lock().is_empty());
}

#[tokio::test]
async fn test_cache_serves_second_render_until_expiry() {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(TileCache::with_clock(DEFAULT_CACHE_DURATION, clock.clone()));
    let renderer = renderer(Arc::clone(&client), Arc::clone(&cache));

    renderer.render(ship(), TargetSize::default()).await;
    let after_first = client.log.lock().len();
    assert_eq!(after_first, 9);

    renderer.render(ship(), TargetSize::default()).await;
    assert_eq!(client.log.lock().len(), after_first);

    clock.advance(DEFAULT_CACHE_DURATION + Duration::from_secs(1));
    renderer.render(ship(), TargetSize::default()).await;
    assert_eq!(client.log.lock().len(), after_first * 2);
}

#[tokio::test]
async fn test_concurrent_renders_share_downloads() {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let cache = Arc::new(TileCache::new(DEFAULT_CACHE_DURATION));
    let renderer = Arc::new(renderer(Arc::clone(&client), cache));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let renderer = Arc::clone(&renderer);
            tokio::spawn(async move { renderer.render(ship(), TargetSize::default()).await })
        })
        .collect();
    for task in tasks {
        assert!(!task.await.unwrap().is_fallback());
    }

    assert_eq!(client.log.lock().len(), 9);
}

#[tokio::test]
async fn test_marker_tracks_small_longitude_moves() {
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let renderer = renderer(
        Arc::clone(&client),
        Arc::new(TileCache::new(DEFAULT_CACHE_DURATION)),
    );
    // Large target: the window covers the whole grid, so the marker moves
    // with the ship instead of the window recentring
    let target = TargetSize::new(768, 768);

    let west = renderer
        .render(GeoPosition::new(62.8568, 58.70).unwrap(), target)
        .await;
    let east = renderer
        .render(GeoPosition::new(62.8568, 58.76).unwrap(), target)
        .await;

    assert!(east.marker.unwrap().0 > west.marker.unwrap().0);
}

#[tokio::test]
async fn test_full_display_frame() {
    let client = Arc::new(ScriptedClient::new(vec!["one.tiles.test"]));
    let renderer = renderer(client, Arc::new(TileCache::new(DEFAULT_CACHE_DURATION)));
    let assembler = DisplayAssembler::default();

    let body = br#"[{"AIS": {"NAME": "SAPPHIRE PRINCESS", "MMSI": 235103357,
        "LATITUDE": 62.8568, "LONGITUDE": 58.7332, "SPEED": 13.3, "COURSE": 226.8,
        "TIMESTAMP": "2024-03-01 12:34:56 UTC"}}]"#;
    let vessel = VesselData::from_api_response(body, "235103357").unwrap();

    let map = renderer
        .render(vessel.position().unwrap(), assembler.map_target())
        .await;
    let frame = assembler.assemble(Some(&vessel), Some(&map));
    let bmp = frame.to_bmp();

    assert_eq!((frame.width(), frame.height()), (800, 480));
    assert_eq!(&bmp[..2], b"BM");
    assert_eq!(bmp.len(), 62 + 100 * 480);
}
