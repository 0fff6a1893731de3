use backdrop_config::OptionsPatch;
use backdrop_core::{Node, NodeKind, PerspectiveCamera};
use backdrop_engine::testing::{MockEngine, MockHost};
use backdrop_engine::{
    ContentBox, Effect, EffectContext, EffectError, LifecycleState, Registry, RegistryError, current,
};

/// Spins a single group node; the camera follows the canvas aspect.
struct Spinner;

impl Effect for Spinner {
    fn name(&self) -> &'static str {
        "spinner"
    }

    fn init(&mut self, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        ctx.scene.add(None, Node::new(NodeKind::Group));
        *ctx.camera = Some(PerspectiveCamera::new(45.0, ctx.size.aspect(), 0.1, 100.0));
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EffectContext<'_>) {
        let root = ctx.scene.children()[0];
        if let Some(node) = ctx.scene.get_mut(root) {
            node.transform.rotation.y = ctx.time.t2 * 0.01;
        }
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register("SPINNER", || Box::new(Spinner));
    registry
}

#[test]
fn registry_constructs_a_running_instance() {
    let host = MockHost::new().with_element("body", ContentBox::new(640.0, 480.0));
    let mut engine = MockEngine::new();
    let instance = registry()
        .create("SPINNER", &OptionsPatch::bound_to("body"), host, &mut engine)
        .unwrap();

    assert_eq!(instance.state(), LifecycleState::Running);
    assert_eq!(instance.effect_name(), "spinner");
    assert_eq!(current(), Some(instance.id()));
}

#[test]
fn unknown_effect_is_reported_before_mounting() {
    let host = MockHost::new().with_element("body", ContentBox::new(640.0, 480.0));
    let mut engine = MockEngine::new();
    let result = registry().create("WAVES", &OptionsPatch::bound_to("body"), host.clone(), &mut engine);

    assert!(matches!(result, Err(RegistryError::UnknownEffect(name)) if name == "WAVES"));
    assert!(host.calls().is_empty());
    assert_eq!(engine.log().created, 0);
}

#[test]
fn speed_scales_animation_time() {
    let host = MockHost::new().with_element("body", ContentBox::new(640.0, 480.0));
    let mut engine = MockEngine::new();
    let patch = OptionsPatch {
        speed: Some(2.0),
        ..OptionsPatch::bound_to("body")
    };
    let mut instance = registry().create("SPINNER", &patch, host.clone(), &mut engine).unwrap();

    host.pump(&mut instance, 10, 1000.0 / 60.0);
    let time = instance.time();
    assert!((time.t - 10.0).abs() < 1e-3);
    assert!((time.t2 - 20.0).abs() < 1e-3);
    assert_eq!(engine.log().renders, 11);
}

#[test]
fn a_ten_second_stall_advances_at_most_five_frames() {
    let host = MockHost::new().with_element("body", ContentBox::new(640.0, 480.0));
    let mut engine = MockEngine::new();
    let mut instance = registry()
        .create("SPINNER", &OptionsPatch::bound_to("body"), host.clone(), &mut engine)
        .unwrap();

    host.pump(&mut instance, 1, 10_000.0);
    assert_eq!(instance.time().t, 5.0);
}

#[test]
fn dropping_an_instance_tears_it_down() {
    let host = MockHost::new().with_element("body", ContentBox::new(640.0, 480.0));
    let mut engine = MockEngine::new();
    let instance = registry()
        .create("SPINNER", &OptionsPatch::bound_to("body"), host.clone(), &mut engine)
        .unwrap();
    drop(instance);

    assert!(host.pending_frames().is_empty());
    assert_eq!(host.resize_listeners(), 0);
    assert_eq!(current(), None);
}
