use mdd_core::{
    current_user_name, user_hash_fragment, BuiltinTemplates, DocumentError, Project, ProjectError,
    TemplateError, TemplateFile, ROOT_DIRECTORY,
};
use std::path::Path;

fn spec_templates() -> Vec<TemplateFile> {
    vec![
        TemplateFile::new(
            "spec.md",
            "# Spec Template\n\n## Goals\n\n<!-- mdd\n-->\n",
        ),
        TemplateFile::new("note.md", "# Note\n\nText.\n"),
    ]
}

fn setup(dir: &Path) -> Project {
    Project::create(dir, "demo", &spec_templates()).unwrap()
}

#[test]
fn create_lays_out_root_and_project_info() {
    let dir = tempfile::tempdir().unwrap();
    let project = setup(dir.path());

    let home = dir.path().join(ROOT_DIRECTORY);
    assert_eq!(project.home_path, home);
    for sub in ["templates", "documents", "publish"] {
        assert!(home.join(sub).is_dir(), "{sub} should exist");
    }

    let data = std::fs::read_to_string(home.join("project.data")).unwrap();
    assert!(data.contains("project: demo"));
    assert_eq!(project.info().unwrap().name(), Some("demo"));

    assert_eq!(project.templates.len(), 2);
    assert!(project.documents.is_empty());
}

#[test]
fn create_refuses_existing_root_and_missing_parent() {
    let dir = tempfile::tempdir().unwrap();
    setup(dir.path());

    let err = Project::create(dir.path(), "again", &spec_templates()).unwrap_err();
    assert!(matches!(err, ProjectError::AlreadyExists(_)));

    let err = Project::create(dir.path().join("absent"), "x", &spec_templates()).unwrap_err();
    assert!(matches!(err, ProjectError::NoSuchDirectory(_)));

    let file = dir.path().join("plain.txt");
    std::fs::write(&file, "x").unwrap();
    let err = Project::create(&file, "x", &spec_templates()).unwrap_err();
    assert!(matches!(err, ProjectError::NotADirectory(_)));
}

#[test]
fn create_with_builtin_templates_loads_them() {
    let dir = tempfile::tempdir().unwrap();
    let project = Project::create(dir.path(), "demo", &BuiltinTemplates).unwrap();
    assert!(project.find_template("adr").is_some());
    assert!(project.find_template("req").is_some());
}

#[test]
fn template_shortcut_and_title_come_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let project = setup(dir.path());

    let spec = project.find_template("spec").unwrap();
    assert_eq!(spec.shortcut, "spec");
    assert_eq!(spec.title, "Spec Template");
    assert_eq!(spec.contents[0], "# Spec Template");
}

#[test]
fn new_document_rewrites_title_and_uses_canonical_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = setup(dir.path());
    let hash = user_hash_fragment(&current_user_name());

    let document = project.new_document("spec", "Widget").unwrap();
    assert_eq!(document.base_filename(), format!("spec-{hash}-0001.md"));
    assert_eq!(document.title.as_deref(), Some("Widget"));
    assert_eq!(document.template, "spec");

    let text = std::fs::read_to_string(&document.filename).unwrap();
    assert_eq!(text, "# Widget\n\n## Goals\n\n<!-- mdd\n-->\n");
}

#[test]
fn new_document_without_title_keeps_template_title_and_gains_block() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = setup(dir.path());

    let document = project.new_document("note", "").unwrap();
    assert_eq!(document.title.as_deref(), Some("Note"));
    let text = std::fs::read_to_string(&document.filename).unwrap();
    assert_eq!(text, "# Note\n\nText.\n\n<!-- mdd\n-->\n");
}

#[test]
fn new_document_requires_known_template() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = setup(dir.path());
    let err = project.new_document("nope", "x").unwrap_err();
    assert!(matches!(err, ProjectError::TemplateNotFound(_)));
}

#[test]
fn load_strict_fails_on_broken_file_and_tolerant_skips_it() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = setup(dir.path());
    project.new_document("spec", "Kept").unwrap();
    std::fs::write(project.document_path.join("README.md"), "# stray\n").unwrap();

    let err = Project::load(&project.home_path, false).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Document(DocumentError::FilenameMismatch(_))
    ));

    let tolerant = Project::load(&project.home_path, true).unwrap();
    assert_eq!(tolerant.documents.len(), 1);

    let (fallback, strict_err) = Project::load_with_fallback(&project.home_path).unwrap();
    assert_eq!(fallback.documents.len(), 1);
    assert!(strict_err.is_some());
}

#[test]
fn load_rejects_template_without_title() {
    let dir = tempfile::tempdir().unwrap();
    let project = setup(dir.path());
    std::fs::write(project.template_path.join("bad.md"), "???\n").unwrap();

    let err = Project::load(&project.home_path, false).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Template(TemplateError::MissingTitle(_))
    ));
    let tolerant = Project::load(&project.home_path, true).unwrap();
    assert_eq!(tolerant.templates.len(), 2);
}

#[test]
fn document_with_unknown_template_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let project = setup(dir.path());
    std::fs::write(project.document_path.join("ghost-aa-0001.md"), "# Ghost\n").unwrap();

    let err = Project::load(&project.home_path, false).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Document(DocumentError::UnknownTemplate(ref s)) if s == "ghost"
    ));
}

#[test]
fn loading_skips_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    let mut project = setup(dir.path());
    project.new_document("spec", "Top").unwrap();
    let nested = project.document_path.join("archive");
    std::fs::create_dir(&nested).unwrap();
    std::fs::write(nested.join("spec-aa-0099.md"), "# Old\n").unwrap();

    let reloaded = Project::load(&project.home_path, false).unwrap();
    assert_eq!(reloaded.documents.len(), 1);
}

#[test]
fn discover_finds_root_below_at_and_above_start() {
    let dir = tempfile::tempdir().unwrap();
    let parent = dir.path().join("work").join("proj");
    std::fs::create_dir_all(&parent).unwrap();
    setup(&parent);

    let from_above = Project::discover_from(dir.path(), false).unwrap();
    assert_eq!(from_above.home_path, parent.join(ROOT_DIRECTORY));

    let from_root_parent = Project::discover_from(&parent, false).unwrap();
    assert_eq!(from_root_parent.home_path, parent.join(ROOT_DIRECTORY));

    let inside = parent.join(ROOT_DIRECTORY).join("documents");
    let from_inside = Project::discover_from(&inside, false).unwrap();
    assert_eq!(from_inside.home_path, parent.join(ROOT_DIRECTORY));
}

#[test]
fn discover_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty");
    std::fs::create_dir(&empty).unwrap();

    match Project::discover_from(&empty, false) {
        Err(ProjectError::NotFound(start)) => assert_eq!(start, empty),
        // A stray `.mdd` above the temp dir would be found through the
        // ancestor check; that is still correct discovery behavior.
        Ok(project) => assert!(!project.home_path.starts_with(dir.path())),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn clear_published_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let project = setup(dir.path());
    std::fs::write(project.publish_path.join("index.html"), "<html/>").unwrap();
    std::fs::create_dir(project.publish_path.join("assets")).unwrap();
    std::fs::write(project.publish_path.join("assets").join("a.css"), "").unwrap();

    assert_eq!(project.clear_published().unwrap(), 2);
    assert_eq!(std::fs::read_dir(&project.publish_path).unwrap().count(), 0);
}
