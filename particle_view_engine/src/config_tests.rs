use super::*;

#[test]
fn test_default_config() {
    let config = RendererConfig::default();
    assert_eq!(config.overlay_size, [512, 128]);
    assert!(config.font.is_none());
    assert_eq!(config.fence_timeout_ns, 60_000_000_000);
    assert_eq!(config.max_acquire_retries, 8);
    assert!(config.wireframe_cube_size > 0.0);
}

#[test]
fn test_font_config_path() {
    let font = FontConfig {
        path: PathBuf::from("/usr/share/fonts/some.ttf"),
        size: 60.0,
    };
    assert_eq!(font.size, 60.0);
    assert!(font.path.to_string_lossy().ends_with(".ttf"));
}
