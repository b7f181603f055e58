fn main() {
    // Only the desktop binary needs the Tauri build step.
    #[cfg(feature = "desktop")]
    {
        // `tauri_build::build()` expects `frontendDist` to exist. The web frontend is built
        // separately, so write a placeholder page when it is missing.
        let manifest_dir = std::path::PathBuf::from(
            std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string()),
        );
        let dist_dir = manifest_dir.join("dist");
        let index_html = dist_dir.join("index.html");
        if !index_html.exists() {
            let _ = std::fs::create_dir_all(&dist_dir);
            let placeholder = r#"<!doctype html>
<meta charset="utf-8" />
<title>Listing Reconciler</title>
<body>Frontend assets are not bundled in this build.</body>
"#;
            if let Err(err) = std::fs::write(&index_html, placeholder) {
                println!(
                    "cargo:warning=failed to write placeholder frontendDist index.html ({:?}): {err}",
                    index_html
                );
            }
        }

        tauri_build::build();
    }
}
