use accretion::assets::{AssetKind, PackKind, ResourceSynthesizer, VirtualAssetPack};
use accretion::Identifier;
use std::path::PathBuf;

fn temp_assets(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("accretion_assets_{}_{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn synth(tag: &str) -> ResourceSynthesizer {
    ResourceSynthesizer::new("accretion", temp_assets(tag)).unwrap()
}

fn doc(pack: &VirtualAssetPack, path: &str) -> serde_json::Value {
    let id = Identifier::of("accretion", path).unwrap();
    let bytes = pack
        .resource(PackKind::ClientAssets, &id)
        .unwrap_or_else(|| panic!("missing resource {}", path));
    serde_json::from_slice(bytes).unwrap()
}

#[test]
fn directory_layout_and_readme_created() {
    let synth = synth("layout");
    for dir in ["textures/item", "textures/block", "models/item", "models/block"] {
        assert!(synth.root().join(dir).is_dir());
    }
    assert!(synth.root().join("README.txt").is_file());
}

#[test]
fn missing_item_texture_falls_back_to_diamond() {
    let mut synth = synth("fallback_item");
    synth.synthesize_item("ruby_sword", "ruby_sword");

    let mut pack = VirtualAssetPack::new("accretion", "test");
    pack.rebuild(&synth);

    let model = doc(&pack, "models/item/ruby_sword.json");
    assert_eq!(model["parent"], "minecraft:item/generated");
    assert_eq!(model["textures"]["layer0"], "minecraft:item/diamond");
}

#[test]
fn loaded_texture_is_referenced_and_served() {
    let mut synth = synth("real_texture");
    std::fs::write(
        synth.root().join("textures/item/ruby.png"),
        b"\x89PNG fake bytes",
    )
    .unwrap();
    assert!(synth.load_texture(AssetKind::Item, "ruby"));
    assert!(synth.is_texture_loaded(AssetKind::Item, "ruby"));
    synth.synthesize_item("ruby", "ruby");

    let mut pack = VirtualAssetPack::new("accretion", "test");
    pack.rebuild(&synth);

    let model = doc(&pack, "models/item/ruby.json");
    assert_eq!(model["textures"]["layer0"], "accretion:item/ruby");

    let texture = Identifier::of("accretion", "textures/item/ruby.png").unwrap();
    assert_eq!(
        pack.resource(PackKind::ClientAssets, &texture),
        Some(b"\x89PNG fake bytes".as_slice())
    );
}

#[test]
fn block_synthesis_produces_all_four_documents() {
    let mut synth = synth("block_docs");
    synth.synthesize_block("marble", "marble");

    let mut pack = VirtualAssetPack::new("accretion", "test");
    pack.rebuild(&synth);

    let block_model = doc(&pack, "models/block/marble.json");
    assert_eq!(block_model["parent"], "minecraft:block/cube_all");
    assert_eq!(block_model["textures"]["all"], "minecraft:block/stone");

    let item_model = doc(&pack, "models/item/marble.json");
    assert_eq!(item_model["parent"], "accretion:block/marble");

    let blockstate = doc(&pack, "blockstates/marble.json");
    assert_eq!(blockstate["variants"][""]["model"], "accretion:block/marble");

    let item_def = doc(&pack, "items/marble.json");
    assert_eq!(item_def["model"]["model"], "accretion:item/marble");
}

#[test]
fn rebuild_twice_is_identical() {
    let mut synth = synth("stable_rebuild");
    synth.synthesize_item("ruby", "ruby");
    synth.synthesize_block("marble", "marble");

    let mut pack = VirtualAssetPack::new("accretion", "test");
    pack.rebuild(&synth);
    let first: Vec<String> = pack.list_resources(PackKind::ClientAssets, "accretion", "");
    let count = pack.len();

    pack.rebuild(&synth);
    let second: Vec<String> = pack.list_resources(PackKind::ClientAssets, "accretion", "");
    assert_eq!(first, second);
    assert_eq!(pack.len(), count);
}

#[test]
fn statics_survive_rebuild() {
    let mut synth = synth("statics");
    let mut pack = VirtualAssetPack::new("accretion", "test");
    pack.add_static(
        "assets/accretion/textures/gui/altar.png",
        b"gui bytes".to_vec(),
    );
    pack.rebuild(&synth);
    pack.rebuild(&synth);

    let gui = Identifier::of("accretion", "textures/gui/altar.png").unwrap();
    assert_eq!(
        pack.resource(PackKind::ClientAssets, &gui),
        Some(b"gui bytes".as_slice())
    );

    // Derived content added outside a rebuild does not survive one.
    pack.add_model("accretion", "item/transient", "{}");
    pack.rebuild(&synth);
    let transient = Identifier::of("accretion", "models/item/transient.json").unwrap();
    assert!(pack.resource(PackKind::ClientAssets, &transient).is_none());
}

#[test]
fn synthesis_is_idempotent_per_id() {
    let mut synth = synth("idempotent");
    synth.synthesize_item("ruby", "ruby");
    synth.synthesize_item("ruby", "ruby");

    let mut pack = VirtualAssetPack::new("accretion", "test");
    pack.rebuild(&synth);
    let models = pack.list_resources(PackKind::ClientAssets, "accretion", "models/item");
    assert_eq!(models, ["models/item/ruby.json"]);
}

#[test]
fn namespaces_reflect_pack_contents() {
    let synth = synth("namespaces");
    let mut pack = VirtualAssetPack::new("accretion", "test");
    pack.rebuild(&synth);
    assert!(pack.namespaces(PackKind::ClientAssets).is_empty());

    pack.add_model("accretion", "item/a", "{}");
    pack.add_model("minecraft", "item/b", "{}");
    let namespaces = pack.namespaces(PackKind::ClientAssets);
    assert_eq!(namespaces, ["accretion".to_string(), "minecraft".to_string()]);
    assert!(pack.namespaces(PackKind::ServerData).is_empty());
}

#[test]
fn load_all_picks_up_files_on_disk() {
    let mut synth = synth("load_all");
    std::fs::write(synth.root().join("textures/item/ruby.png"), b"png").unwrap();
    std::fs::write(synth.root().join("textures/block/marble.png"), b"png").unwrap();
    std::fs::write(
        synth.root().join("models/item/custom.json"),
        r#"{"parent":"minecraft:item/handheld"}"#,
    )
    .unwrap();

    let count = synth.load_all().unwrap();
    assert_eq!(count, 3);
    assert!(synth.is_texture_loaded(AssetKind::Item, "ruby"));
    assert!(synth.is_texture_loaded(AssetKind::Block, "marble"));
}

#[test]
fn pack_id_carries_the_namespace() {
    let pack = VirtualAssetPack::new("accretion", "test");
    assert_eq!(pack.pack_id(), "accretion_dynamic");
}
