//! Integration tests for the directive render procedure against real
//! template files on disk.

mod common;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::json;

use common::{RecordingDeps, RecordingOutput, RecordingWarnings};
use mdbook_tera_block::config::{RawConfig, RenderConfig};
use mdbook_tera_block::directive::DirectiveOptions;
use mdbook_tera_block::host::WarningCategory;
use mdbook_tera_block::template_engine::{render_directive, DocumentContext, RenderRequest};

struct Run {
    warnings: RecordingWarnings,
    deps: RecordingDeps,
    output: RecordingOutput,
}

fn render(options: DirectiveOptions, body: &str, config: &RenderConfig, src_root: &Path) -> Run {
    let doc = DocumentContext {
        doc_path: "guide/page.md".into(),
        src_root: src_root.to_path_buf(),
    };
    let mut run = Run {
        warnings: RecordingWarnings::default(),
        deps: RecordingDeps::default(),
        output: RecordingOutput::default(),
    };
    let request = RenderRequest {
        options: &options,
        body,
        line: 9,
        body_line: 10,
        doc: &doc,
    };
    render_directive(
        &request,
        config,
        &mut run.warnings,
        &mut run.deps,
        &mut run.output,
    );
    run
}

#[test]
fn test_inheritance_chain_renders_and_registers_all_levels() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("guide")).unwrap();
    fs::write(
        dir.path().join("base.tera"),
        "{% include \"banner.tera\" %}\n{% block body %}default{% endblock %}",
    )
    .unwrap();
    fs::write(dir.path().join("banner.tera"), "## {{ title }}").unwrap();

    let body = "{% extends \"base.tera\" %}{% block body %}custom {{ title }}{% endblock %}";
    let options = DirectiveOptions {
        ctx: Some(r#"{"title": "Guide"}"#.to_string()),
        ..DirectiveOptions::default()
    };
    let run = render(options, body, &RenderConfig::default(), dir.path());

    assert!(run.warnings.entries.is_empty(), "{:?}", run.warnings.entries);
    assert_eq!(run.output.inserted.len(), 1);
    let rendered = &run.output.inserted[0].0;
    assert!(rendered.contains("## Guide"));
    assert!(rendered.contains("custom Guide"));

    let mut deps = run.deps.paths.clone();
    deps.sort();
    assert_eq!(
        deps,
        vec![
            dir.path().join("banner.tera"),
            dir.path().join("base.tera")
        ]
    );
}

#[test]
fn test_changed_template_file_changes_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("guide")).unwrap();
    let template = dir.path().join("guide/version.tera");
    fs::write(&template, "version: 1").unwrap();

    let options = DirectiveOptions {
        file: Some("version.tera".to_string()),
        ..DirectiveOptions::default()
    };
    let first = render(options.clone(), "", &RenderConfig::default(), dir.path());
    assert_eq!(first.output.inserted[0].0, "version: 1");
    assert_eq!(first.deps.paths, vec![template.clone()]);

    fs::write(&template, "version: 2").unwrap();
    let second = render(options, "", &RenderConfig::default(), dir.path());
    assert_eq!(second.output.inserted[0].0, "version: 2");
}

#[test]
fn test_precedence_env_named_inline() {
    let dir = tempfile::tempdir().unwrap();
    let raw = RawConfig {
        contexts: HashMap::from([(
            "release".to_string(),
            json!({"channel": "stable", "arch": "x86_64"}),
        )]),
        ..RawConfig::default()
    };
    let config = RenderConfig::from_raw(raw);

    let options = DirectiveOptions {
        context_name: Some("release".to_string()),
        ctx: Some(r#"{"channel": "nightly"}"#.to_string()),
        ..DirectiveOptions::default()
    };
    let run = render(
        options,
        "{{ channel }}-{{ arch }} from {{ env.doc }}",
        &config,
        dir.path(),
    );
    assert!(run.warnings.entries.is_empty());
    assert_eq!(run.output.inserted[0].0, "nightly-x86_64 from guide/page.md");
}

#[test]
fn test_file_attribution_resets_to_line_one() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("guide")).unwrap();
    let template = dir.path().join("guide/body.tera");
    fs::write(&template, "text").unwrap();

    let options = DirectiveOptions {
        file: Some("body.tera".to_string()),
        ..DirectiveOptions::default()
    };
    let run = render(options, "", &RenderConfig::default(), dir.path());
    let (_, origin) = &run.output.inserted[0];
    assert_eq!(origin.file, template);
    assert_eq!(origin.line, 1);
}

#[test]
fn test_inline_attribution_uses_body_line() {
    let dir = tempfile::tempdir().unwrap();
    let run = render(
        DirectiveOptions::default(),
        "plain",
        &RenderConfig::default(),
        dir.path(),
    );
    let (_, origin) = &run.output.inserted[0];
    assert_eq!(origin.file, dir.path().join("guide/page.md"));
    assert_eq!(origin.line, 10);
}

#[test]
fn test_warnings_point_at_the_directive_line() {
    let dir = tempfile::tempdir().unwrap();
    let options = DirectiveOptions {
        context_name: Some("absent".to_string()),
        ..DirectiveOptions::default()
    };
    let run = render(options, "x", &RenderConfig::default(), dir.path());
    assert_eq!(run.warnings.entries.len(), 1);
    let (location, _, _) = &run.warnings.entries[0];
    assert_eq!(location.file, dir.path().join("guide/page.md"));
    // The directive sits on the line above its body.
    assert_eq!(location.line, 9);
}

#[test]
fn test_raw_output_carries_format_and_origin() {
    let dir = tempfile::tempdir().unwrap();
    let options = DirectiveOptions {
        raw: Some("html".to_string()),
        ctx: Some(r#"{"cls": "note"}"#.to_string()),
        ..DirectiveOptions::default()
    };
    let run = render(
        options,
        "<div class=\"{{ cls }}\"></div>",
        &RenderConfig::default(),
        dir.path(),
    );
    assert!(run.warnings.entries.is_empty());
    assert!(run.output.inserted.is_empty());
    let (text, format, origin) = &run.output.raw[0];
    assert_eq!(text, "<div class=\"note\"></div>");
    assert_eq!(format, "html");
    assert_eq!(origin.line, 10);
}

#[test]
fn test_every_error_path_yields_one_warning_and_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig::default();

    let cases: Vec<(DirectiveOptions, &str, WarningCategory)> = vec![
        (
            DirectiveOptions {
                context_name: Some("absent".to_string()),
                ..DirectiveOptions::default()
            },
            "x",
            WarningCategory::ContextNotFound,
        ),
        (
            DirectiveOptions {
                ctx: Some("[1, 2]".to_string()),
                ..DirectiveOptions::default()
            },
            "x",
            WarningCategory::CtxOptionNotAMap,
        ),
        (
            DirectiveOptions {
                ctx: Some("{broken".to_string()),
                ..DirectiveOptions::default()
            },
            "x",
            WarningCategory::CtxOptionInvalidJson,
        ),
        (
            DirectiveOptions {
                file: Some("no/such/file.tera".to_string()),
                ..DirectiveOptions::default()
            },
            "",
            WarningCategory::FileRead,
        ),
        (
            DirectiveOptions::default(),
            "{{ never_defined }}",
            WarningCategory::Render,
        ),
        (
            DirectiveOptions::default(),
            "{% endfor %}",
            WarningCategory::Render,
        ),
    ];

    for (options, body, expected) in cases {
        let run = render(options, body, &config, dir.path());
        assert_eq!(run.warnings.categories(), vec![expected]);
        assert!(
            run.output.inserted.is_empty(),
            "expected no output for {expected:?}"
        );
        assert!(run.output.debug_blocks.is_empty());
    }
}

#[test]
fn test_undefined_variable_warning_names_the_variable() {
    let dir = tempfile::tempdir().unwrap();
    let run = render(
        DirectiveOptions::default(),
        "{{ release_tag }}",
        &RenderConfig::default(),
        dir.path(),
    );
    assert_eq!(run.warnings.categories(), vec![WarningCategory::Render]);
    let message = run.warnings.messages()[0];
    assert!(message.contains("release_tag"), "got: {message}");
}

#[test]
fn test_debug_emits_verbatim_rendered_text() {
    let dir = tempfile::tempdir().unwrap();
    let options = DirectiveOptions {
        debug: true,
        ctx: Some(r#"{"a": 1, "b": 2}"#.to_string()),
        ..DirectiveOptions::default()
    };
    let run = render(
        options,
        "{{ a }} and {{ b }}",
        &RenderConfig::default(),
        dir.path(),
    );
    assert_eq!(run.output.inserted.len(), 1);
    assert_eq!(run.output.debug_blocks.len(), 1);
    assert_eq!(run.output.debug_blocks[0].0, run.output.inserted[0].0);
}

#[test]
fn test_custom_filter_via_registry() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RenderConfig::default();
    config.filters.register(
        "reverse_words",
        std::sync::Arc::new(|value: &serde_json::Value, _args: &HashMap<String, serde_json::Value>| {
            let s = value
                .as_str()
                .ok_or_else(|| tera::Error::msg("reverse_words expects a string"))?;
            Ok(serde_json::Value::String(
                s.split_whitespace().rev().collect::<Vec<_>>().join(" "),
            ))
        }),
    );

    let options = DirectiveOptions {
        ctx: Some(r#"{"phrase": "one two three"}"#.to_string()),
        ..DirectiveOptions::default()
    };
    let run = render(options, "{{ phrase | reverse_words }}", &config, dir.path());
    assert!(run.warnings.entries.is_empty());
    assert_eq!(run.output.inserted[0].0, "three two one");
}
