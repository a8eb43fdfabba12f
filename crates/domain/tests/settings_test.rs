use doh_relay_domain::{Settings, SettingsPatch};
use serde_json::{json, Map, Value};

fn as_map(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => panic!("not an object"),
    }
}

#[test]
fn test_to_map_from_map_round_trip() {
    let samples = [
        Settings::default(),
        Settings {
            enabled: true,
            configuration: "abc123".to_string(),
            disable_check_update: false,
        },
        Settings {
            enabled: false,
            configuration: "".to_string(),
            disable_check_update: true,
        },
    ];

    for settings in samples {
        assert_eq!(Settings::from_map(&settings.to_map()), settings);
    }
}

#[test]
fn test_to_map_keys() {
    let map = Settings {
        enabled: true,
        configuration: "abc123".to_string(),
        disable_check_update: true,
    }
    .to_map();

    assert_eq!(map.get("enabled"), Some(&json!(true)));
    assert_eq!(map.get("configuration"), Some(&json!("abc123")));
    assert_eq!(map.get("disableCheckUpdate"), Some(&json!(true)));
    assert_eq!(map.len(), 3);
}

#[test]
fn test_from_map_ignores_unknown_and_ill_typed_values() {
    let map = as_map(json!({
        "configuration": "abc123",
        "enabled": "yes",
        "theme": "dark",
    }));

    let settings = Settings::from_map(&map);
    assert_eq!(settings.configuration, "abc123");
    assert!(!settings.enabled);
    assert!(!settings.disable_check_update);
}

#[test]
fn test_from_map_accepts_capitalised_keys() {
    let map = as_map(json!({
        "Configuration": "abc123",
        "DisableCheckUpdate": true,
    }));

    let settings = Settings::from_map(&map);
    assert_eq!(settings.configuration, "abc123");
    assert!(settings.disable_check_update);
}

#[test]
fn test_merge_keeps_absent_keys() {
    let mut settings = Settings {
        enabled: true,
        configuration: "old".to_string(),
        disable_check_update: true,
    };
    settings.merge_map(&as_map(json!({ "configuration": "new" })));

    assert!(settings.enabled);
    assert!(settings.disable_check_update);
    assert_eq!(settings.configuration, "new");
}

#[test]
fn test_empty_patch() {
    let patch = SettingsPatch::from_map(&as_map(json!({ "unrelated": 1 })));
    assert!(patch.is_empty());
}
