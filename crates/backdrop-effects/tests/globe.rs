use std::io;
use std::sync::{Arc, Mutex};

use backdrop_config::OptionsPatch;
use backdrop_core::{Blending, Color, LineSegments, Node, NodeKind, Scene, Vec3};
use backdrop_effects::globe::wave_height;
use backdrop_effects::{GlobeEffect, register_builtin};
use backdrop_engine::testing::{HostCall, MockEngine, MockHost, MockRenderer};
use backdrop_engine::{ContentBox, EffectInstance, LifecycleState, Registry, SetupError};

fn host() -> MockHost {
    MockHost::new().with_element("#hero", ContentBox::new(1280.0, 720.0))
}

fn bound_with(keys: &[(&str, toml::Value)]) -> OptionsPatch {
    let mut patch = OptionsPatch::bound_to("#hero");
    for (key, value) in keys {
        patch.effect.insert(key.to_string(), value.clone());
    }
    patch
}

fn small_lattice() -> OptionsPatch {
    bound_with(&[
        ("points", toml::Value::Integer(2)),
        ("spacing", toml::Value::Float(10.0)),
        ("max_distance", toml::Value::Float(15.0)),
    ])
}

/// Shared buffer for a test subscriber's output.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn network_lines(scene: &Scene) -> &LineSegments {
    scene
        .pre_order()
        .into_iter()
        .filter_map(|id| scene.get(id))
        .filter_map(Node::lines)
        .find(|lines| lines.material.vertex_colors)
        .expect("network line mesh")
}

fn point_positions(scene: &Scene) -> Vec<Vec3> {
    scene
        .pre_order()
        .into_iter()
        .filter_map(|id| scene.get(id))
        .filter(|node| matches!(node.kind, NodeKind::Marker { .. } | NodeKind::Anchor))
        .map(|node| node.transform.position)
        .collect()
}

fn pairs_within(points: &[Vec3], max_distance: f32) -> usize {
    let mut count = 0;
    for i in 0..points.len() {
        for j in i..points.len() {
            if points[i].distance(points[j]) < max_distance {
                count += 1;
            }
        }
    }
    count
}

fn globe(patch: &OptionsPatch, host: &MockHost, engine: &mut MockEngine) -> EffectInstance<MockHost, MockRenderer> {
    EffectInstance::new(Box::new(GlobeEffect::with_seed(11)), patch, host.clone(), engine)
}

#[test]
fn nine_point_lattice_connects_exactly_the_close_pairs() {
    let host = host();
    let mut engine = MockEngine::new();
    let mut instance = globe(&small_lattice(), &host, &mut engine);
    assert_eq!(instance.state(), LifecycleState::Running);

    for _ in 0..5 {
        host.pump(&mut instance, 1, 1000.0 / 60.0);
        let scene = instance.scene();
        let points = point_positions(scene);
        assert_eq!(points.len(), 9);

        let mut xz: Vec<(f32, f32)> = points.iter().map(|p| (p.x, p.z)).collect();
        xz.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<(f32, f32)> = [-10.0, 0.0, 10.0]
            .iter()
            .flat_map(|&x| [-10.0, 0.0, 10.0].map(|z| (x, z)))
            .collect();
        assert_eq!(xz, expected);

        let lines = network_lines(scene);
        let visible = lines.geometry.draw_range() / 2;
        assert_eq!(visible, pairs_within(&points, 15.0));
        assert!(visible <= 9 * 10 / 2);
        for (a, b, _) in lines.geometry.segments() {
            assert!(a.distance(b) < 15.0);
        }
    }
}

#[test]
fn wave_phase_ignores_the_speed_multiplier() {
    let host = host();
    let mut engine = MockEngine::new();
    let patch = OptionsPatch {
        speed: Some(4.0),
        ..small_lattice()
    };
    let mut instance = globe(&patch, &host, &mut engine);
    host.pump(&mut instance, 10, 1000.0 / 60.0);

    let time = instance.time();
    assert!((time.t - 10.0).abs() < 1e-3);
    assert!((time.t2 - 40.0).abs() < 1e-3);
    for p in point_positions(instance.scene()) {
        let expected = wave_height(Vec3::new(p.x, 0.0, p.z), time.t);
        assert!((p.y - expected).abs() < 1e-5, "y {} at ({}, {}), expected {expected}", p.y, p.x, p.z);
    }
}

#[test]
fn line_buffer_is_uploaded_every_frame() {
    let host = host();
    let mut engine = MockEngine::new();
    let mut instance = globe(&small_lattice(), &host, &mut engine);
    let before = engine.log().uploads;
    host.pump(&mut instance, 3, 1000.0 / 60.0);
    assert!(engine.log().uploads >= before + 3);
}

#[test]
fn blend_mode_only_changes_on_restart() {
    let host = host();
    let mut engine = MockEngine::new();
    let mut instance = globe(&small_lattice(), &host, &mut engine);
    assert_eq!(network_lines(instance.scene()).material.blending, Blending::Additive);

    instance.set_options(&OptionsPatch {
        background_color: Some(Color::WHITE),
        ..OptionsPatch::default()
    });
    host.pump(&mut instance, 3, 1000.0 / 60.0);
    assert_eq!(network_lines(instance.scene()).material.blending, Blending::Additive);

    instance.restart();
    assert_eq!(instance.state(), LifecycleState::Running);
    assert_eq!(network_lines(instance.scene()).material.blending, Blending::Normal);
}

#[test]
fn hidden_dots_use_invisible_anchors() {
    let host = host();
    let mut engine = MockEngine::new();
    let patch = bound_with(&[
        ("points", toml::Value::Integer(3)),
        ("show_dots", toml::Value::Boolean(false)),
    ]);
    let instance = globe(&patch, &host, &mut engine);
    let scene = instance.scene();
    let ids = scene.pre_order();
    let kinds: Vec<&NodeKind> = ids.iter().filter_map(|id| scene.get(*id)).map(|n| &n.kind).collect();
    assert_eq!(kinds.iter().filter(|k| matches!(k, NodeKind::Anchor)).count(), 16);
    assert!(!kinds.iter().any(|k| matches!(k, NodeKind::Marker { .. })));
}

#[test]
fn unresolvable_target_leaves_nothing_behind() {
    let host = host();
    let mut engine = MockEngine::new();
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let instance = tracing::subscriber::with_default(subscriber, || {
        globe(&OptionsPatch::bound_to("#nope"), &host, &mut engine)
    });

    let output = logs.contents();
    assert!(output.contains("cannot bind effect"), "{output}");
    assert!(output.contains("#nope"), "{output}");
    assert_eq!(instance.state(), LifecycleState::Uninitialized);
    assert!(matches!(instance.setup_error(), Some(SetupError::BindTarget(_))));
    assert!(!instance.has_surface());
    assert!(instance.scene().is_empty());
}

#[test]
fn invalid_spacing_falls_back_to_background() {
    let host = host();
    let mut engine = MockEngine::new();
    let patch = bound_with(&[("spacing", toml::Value::Float(f64::NAN))]);
    let instance = globe(&patch, &host, &mut engine);

    assert_eq!(instance.state(), LifecycleState::FailedInit);
    let el = host.element("#hero").unwrap();
    assert!(host.calls().contains(&HostCall::Fallback(el, Color::from_hex(0x23153c))));
    assert!(!instance.has_surface());
}

#[test]
fn resize_below_minimums_reports_minimums() {
    let host = host();
    let mut engine = MockEngine::new();
    let mut instance = globe(&small_lattice(), &host, &mut engine);

    host.set_content_box("#hero", ContentBox::new(0.0, 0.0));
    instance.handle_resize();
    assert_eq!((instance.size().width, instance.size().height), (200.0, 200.0));
    assert_eq!(instance.camera().unwrap().aspect, 1.0);
}

#[test]
fn narrow_viewport_reframes_the_camera() {
    let host = host();
    let mut engine = MockEngine::new();
    let mut instance = globe(&small_lattice(), &host, &mut engine);
    assert_eq!(instance.camera().unwrap().target().x, -40.0);

    host.set_viewport_width(400.0);
    host.pump(&mut instance, 1, 1000.0 / 60.0);
    assert_eq!(instance.camera().unwrap().target().x, -10.0);
}

#[test]
fn builtin_registry_knows_both_names() {
    let mut registry = Registry::new();
    register_builtin(&mut registry);
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["GLOBE", "globe"]);

    let host = host();
    let mut engine = MockEngine::new();
    let instance = registry
        .create("GLOBE", &OptionsPatch::bound_to("#hero"), host, &mut engine)
        .unwrap();
    assert_eq!(instance.effect_name(), "globe");
    assert_eq!(instance.options().effect.get("points"), Some(&toml::Value::Integer(10)));
    assert_eq!(point_positions(instance.scene()).len(), 121);
}
