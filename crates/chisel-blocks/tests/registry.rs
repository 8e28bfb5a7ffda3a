use chisel_blocks::config::{StateDef, StatesConfig};
use chisel_blocks::{AIR, StateProperties, StateRegistry, StateTable, VoxelKind};
use proptest::prelude::*;

const SAMPLE: &str = r#"
    [[states]]
    name = "stone"
    id = 1

    [[states]]
    name = "glowstone"
    light = 15

    [[states]]
    name = "water"
    id = 9
    fluid = true

    [[states]]
    name = "glass"
    opacity = 0.1
"#;

#[test]
fn air_is_always_registered() {
    let reg = StateRegistry::new();
    assert_eq!(reg.id_by_name("air"), Some(AIR));
    assert_eq!(reg.kind(AIR), VoxelKind::Air);
    assert!(reg.is_empty());
}

#[test]
fn loads_states_from_toml() {
    let reg = StateRegistry::from_toml_str(SAMPLE).expect("registry");
    let stone = reg.id_by_name("stone").unwrap();
    let water = reg.id_by_name("water").unwrap();
    assert_eq!(stone, 1);
    assert_eq!(water, 9);
    // implicit ids start after the highest explicit id
    let glow = reg.id_by_name("glowstone").unwrap();
    let glass = reg.id_by_name("glass").unwrap();
    assert_eq!(glow, 10);
    assert_eq!(glass, 11);

    assert_eq!(reg.resolve(glow).light_value, 15);
    assert_eq!(reg.kind(water), VoxelKind::Fluid);
    assert!((reg.resolve(glass).opacity - 0.1).abs() < 1e-6);
    assert!((reg.resolve(stone).opacity - 1.0).abs() < 1e-6);
}

#[test]
fn unknown_ids_resolve_as_solid() {
    let reg = StateRegistry::new();
    assert_eq!(reg.properties(4242), None);
    assert_eq!(reg.resolve(4242), StateProperties::UNKNOWN);
    assert_eq!(reg.kind(4242), VoxelKind::Solid);
}

#[test]
fn rejects_air_id_and_duplicates() {
    let air_clash = StatesConfig {
        states: vec![StateDef {
            name: "bogus".into(),
            id: Some(0),
            light: None,
            opacity: None,
            fluid: None,
        }],
    };
    assert!(StateRegistry::from_config(air_clash).is_err());

    let dup = r#"
        [[states]]
        name = "a"
        id = 3
        [[states]]
        name = "b"
        id = 3
    "#;
    assert!(StateRegistry::from_toml_str(dup).is_err());
}

proptest! {
    // light is clamped into 0..=15 and opacity into 0..=1
    #[test]
    fn props_are_clamped(light in any::<u8>(), opacity in -4.0f32..4.0) {
        let cfg = StatesConfig {
            states: vec![StateDef {
                name: "s".into(),
                id: None,
                light: Some(light),
                opacity: Some(opacity),
                fluid: None,
            }],
        };
        let reg = StateRegistry::from_config(cfg).unwrap();
        let p = reg.resolve(reg.id_by_name("s").unwrap());
        prop_assert!(p.light_value <= 15);
        prop_assert!((0.0..=1.0).contains(&p.opacity));
    }
}
