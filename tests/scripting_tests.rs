#![cfg(feature = "scripting")]

use accretion::component::BracketParser;
use accretion::definition::ItemDefinition;
use accretion::registry::Registrar;
use accretion::scripting::{EventPayload, HostState, ScriptHost};
use accretion::world::{Player, World};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn temp_scripts(tag: &str) -> PathBuf {
    init_logging();
    let dir = std::env::temp_dir().join(format!("accretion_scripts_{}_{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn host_with(tag: &str, scripts: &[(&str, &str)]) -> (ScriptHost, Arc<Registrar>, Arc<Mutex<World>>) {
    let dir = temp_scripts(tag);
    for (name, code) in scripts {
        std::fs::write(dir.join(name), code).unwrap();
    }
    let registrar = Arc::new(
        Registrar::with_default_registries("accretion", Box::new(BracketParser)).unwrap(),
    );
    let world = Arc::new(Mutex::new(World::new()));
    let mut host = ScriptHost::new(dir, registrar.clone(), world.clone()).unwrap();
    host.init().unwrap();
    (host, registrar, world)
}

#[test]
fn default_config_file_is_created() {
    let (host, _, _) = host_with("config", &[]);
    assert_eq!(host.state(), HostState::Ready);
    assert!(host.config().enabled);
    assert_eq!(host.config().sandbox.max_execution_time_ms, 5000);

    let config: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(
            std::env::temp_dir()
                .join(format!("accretion_scripts_config_{}", std::process::id()))
                .join("config.json"),
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(config["enabled"], true);
    assert_eq!(config["sandbox"]["allow_file_access"], false);
}

#[test]
fn handler_cancels_the_event() {
    let (host, _, _) = host_with(
        "cancel",
        &[(
            "cancel.js",
            r#"Events.on("block_break", function(ctx) { ctx.cancel(); });"#,
        )],
    );
    let outcome = host.fire_event("block_break", EventPayload::new());
    assert!(outcome.cancelled);
}

#[test]
fn handler_sets_a_result() {
    let (host, _, _) = host_with(
        "result",
        &[(
            "result.js",
            r#"Events.on("use_item", function(ctx) { ctx.result = "SUCCESS"; });"#,
        )],
    );
    let outcome = host.fire_event("use_item", EventPayload::new());
    assert!(!outcome.cancelled);
    assert_eq!(outcome.result.as_deref(), Some("SUCCESS"));
}

#[test]
fn throwing_handler_does_not_starve_the_next_one() {
    let (host, _, world) = host_with(
        "isolation",
        &[
            (
                "a_throws.js",
                r#"Events.on("evt", function(ctx) { throw new Error("boom"); });"#,
            ),
            (
                "b_runs.js",
                r#"Events.on("evt", function(ctx) { Accretion.spawn_particle("flame", 1, 2, 3); });"#,
            ),
        ],
    );
    assert_eq!(host.loaded_scripts().len(), 2);

    let outcome = host.fire_event("evt", EventPayload::new());
    assert!(!outcome.cancelled);
    let world = world.lock().unwrap();
    assert_eq!(world.particles.len(), 1);
    assert_eq!(world.particles[0].particle, "flame");
}

#[test]
fn double_registration_fires_twice() {
    let (host, _, world) = host_with(
        "double",
        &[(
            "double.js",
            r#"
            function emit(ctx) { Accretion.spawn_particle("smoke", 0, 0, 0); }
            Events.on("evt", emit);
            Events.on("evt", emit);
            "#,
        )],
    );
    assert_eq!(host.bus().handler_count("evt"), 2);
    host.fire_event("evt", EventPayload::new());
    assert_eq!(world.lock().unwrap().particles.len(), 2);
}

#[test]
fn payload_fields_are_readable_and_missing_keys_are_undefined() {
    let (host, _, world) = host_with(
        "payload",
        &[(
            "payload.js",
            r#"
            Events.on("block_break", function(ctx) {
                if (ctx.get("block") === "minecraft:stone" && ctx.get("missing") === undefined) {
                    Accretion.spawn_particle("ok", 0, 0, 0);
                }
            });
            "#,
        )],
    );
    let payload = EventPayload::new().field("block", serde_json::json!("minecraft:stone"));
    host.fire_event("block_break", payload);
    assert_eq!(world.lock().unwrap().particles.len(), 1);
}

#[test]
fn scripts_drive_the_helper_api_through_the_player_wrapper() {
    let (host, registrar, world) = host_with(
        "api",
        &[(
            "give.js",
            r#"
            Events.on("use_altar", function(ctx) {
                var p = ctx.player;
                if (p && p.name === "steve") {
                    Accretion.give_item(p, "ruby", 1);
                    Accretion.send_message(p, "granted: " + ctx.get("reason"));
                }
            });
            "#,
        )],
    );

    let mut def = ItemDefinition::new("ruby");
    def.components.insert("rarity".into(), serde_json::json!("rare"));
    registrar.register_item(&def).unwrap();

    let steve = world.lock().unwrap().add_player(Player::new("steve"));

    let payload = EventPayload::new()
        .field("reason", serde_json::json!("altar"))
        .with_player(steve.clone());
    host.fire_event("use_altar", payload);

    let steve = steve.lock().unwrap();
    assert_eq!(steve.inventory.len(), 1);
    assert_eq!(steve.inventory[0].item.id.path(), "ruby");
    assert_eq!(steve.messages, ["granted: altar"]);
}

#[test]
fn reload_clears_handlers_and_reloads_the_directory() {
    let dir = temp_scripts("reload");
    std::fs::write(
        dir.join("old.js"),
        r#"Events.on("evt", function(ctx) { ctx.cancel(); });"#,
    )
    .unwrap();

    let registrar = Arc::new(
        Registrar::with_default_registries("accretion", Box::new(BracketParser)).unwrap(),
    );
    let world = Arc::new(Mutex::new(World::new()));
    let mut host = ScriptHost::new(dir.clone(), registrar, world).unwrap();
    host.init().unwrap();
    assert!(host.fire_event("evt", EventPayload::new()).cancelled);

    std::fs::remove_file(dir.join("old.js")).unwrap();
    host.reload().unwrap();
    assert_eq!(host.state(), HostState::Ready);
    assert_eq!(host.bus().handler_count("evt"), 0);
    assert!(!host.fire_event("evt", EventPayload::new()).cancelled);
}

#[test]
fn broken_script_is_skipped_but_others_load() {
    let (host, _, _) = host_with(
        "broken",
        &[
            ("bad.js", "this is not javascript ((("),
            (
                "good.js",
                r#"Events.on("evt", function(ctx) { ctx.cancel(); });"#,
            ),
        ],
    );
    assert_eq!(host.loaded_scripts(), ["good.js"]);
    assert!(host.fire_event("evt", EventPayload::new()).cancelled);
}

#[test]
fn disabled_config_leaves_the_host_inert() {
    let dir = temp_scripts("disabled");
    std::fs::write(
        dir.join("config.json"),
        r#"{"enabled": false, "sandbox": {}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("never.js"),
        r#"Events.on("evt", function(ctx) { ctx.cancel(); });"#,
    )
    .unwrap();

    let registrar = Arc::new(
        Registrar::with_default_registries("accretion", Box::new(BracketParser)).unwrap(),
    );
    let world = Arc::new(Mutex::new(World::new()));
    let mut host = ScriptHost::new(dir, registrar, world).unwrap();
    host.init().unwrap();

    assert_eq!(host.state(), HostState::Ready);
    assert!(host.loaded_scripts().is_empty());
    assert!(!host.fire_event("evt", EventPayload::new()).cancelled);
}

#[test]
fn shutdown_closes_the_host_for_good() {
    let (mut host, _, _) = host_with("shutdown", &[]);
    host.shutdown();
    assert_eq!(host.state(), HostState::Closed);
    assert!(host.init().is_err());
    assert!(host.reload().is_err());
}
