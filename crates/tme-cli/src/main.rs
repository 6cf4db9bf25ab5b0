//! `tme`: edit threat-model YAML from the command line
//!
//! Loads one model file, applies a single intent through the editor and
//! prints the re-serialized document (or writes it back with `--write`).
//! Outcome summaries go to stderr as JSON; logs are controlled by `RUST_LOG`.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tme_document::{DocPath, Node};
use tme_editor::{reintegrate, DeleteMode, EditError, Editor, EditorConfig, EntityKind};
use tme_integrity::alias_count;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let collection = Arg::new("collection")
        .required(true)
        .help("Collection path, e.g. data_assets or technical_assets.web.communication_links");

    Command::new("tme")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Threat-model editor: key renames, deletes and id edits with reference integrity")
        .subcommand_required(true)
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Threat-model YAML file"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("Editor config YAML file"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .default_value("plain")
                .value_parser(["plain", "json"])
                .help("Log output format"),
        )
        .arg(
            Arg::new("write")
                .long("write")
                .action(ArgAction::SetTrue)
                .help("Write the result back to the model file instead of stdout"),
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .action(ArgAction::SetTrue)
                .help("Include the diagnostic trace in the outcome summary"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Seed for issued keys and ids"),
        )
        .subcommand(
            Command::new("rename")
                .about("Rename an entity key")
                .arg(collection.clone())
                .arg(Arg::new("old").required(true).help("Current key"))
                .arg(Arg::new("new").required(true).help("New key")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an entity")
                .arg(collection.clone())
                .arg(Arg::new("key").required(true).help("Entity key"))
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .default_value("cascade")
                        .value_parser(["cascade", "cascade-with-dependents", "item-only"])
                        .help("How references to the entity are treated"),
                ),
        )
        .subcommand(
            Command::new("set")
                .about("Set a field of an entity")
                .arg(collection.clone())
                .arg(Arg::new("key").required(true).help("Entity key"))
                .arg(Arg::new("field").required(true).help("Field path relative to the entity"))
                .arg(Arg::new("value").required(true).help("Value as YAML")),
        )
        .subcommand(
            Command::new("create")
                .about("Create an entity with an issued key and id")
                .arg(collection)
                .arg(Arg::new("body").long("body").help("Entity body as YAML map")),
        )
        .subcommand(
            Command::new("show")
                .about("Print the node at a path with aliases resolved")
                .arg(Arg::new("path").help("Document path, root when omitted"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("check").about("Check that the model survives a write/read round trip"))
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    let format = matches
        .get_one::<String>("log-format")
        .map_or("plain", String::as_str);
    init_tracing(format);

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if err
                .downcast_ref::<EditError>()
                .is_some_and(EditError::requires_undo)
            {
                eprintln!("the edit could not be completed; the model file was not written");
                return ExitCode::from(2);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let model = matches
        .get_one::<PathBuf>("model")
        .context("missing --model")?;
    let config = load_config(matches.get_one::<PathBuf>("config"))?;
    let text = fs::read_to_string(model)
        .with_context(|| format!("reading {}", model.display()))?;
    let mut editor = Editor::from_yaml(&text, config)
        .with_context(|| format!("parsing {}", model.display()))?;
    if let Some(seed) = matches.get_one::<u64>("seed") {
        editor = editor.with_key_seed(*seed);
    }

    let Some((name, args)) = matches.subcommand() else {
        bail!("no command given");
    };
    let Some(edited) = execute(&mut editor, name, args, matches.get_flag("trace"))? else {
        return Ok(());
    };

    if matches.get_flag("write") {
        fs::write(model, &edited).with_context(|| format!("writing {}", model.display()))?;
        tracing::info!("Wrote {}", model.display());
    } else {
        print!("{edited}");
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    EditorConfig::from_yaml_str(&text).with_context(|| format!("loading {}", path.display()))
}

/// Run one command; `Some` carries the edited document text
fn execute(
    editor: &mut Editor,
    name: &str,
    args: &ArgMatches,
    with_trace: bool,
) -> Result<Option<String>> {
    let text = match name {
        "rename" => {
            let outcome = editor.rename_entity_key(
                &collection(args)?,
                required(args, "old")?,
                required(args, "new")?,
            )?;
            summarize(&outcome, with_trace)?;
            outcome.text
        }
        "delete" => {
            let mode: DeleteMode = required(args, "mode")?.parse()?;
            let outcome = editor.delete_entity(&collection(args)?, required(args, "key")?, mode)?;
            summarize(&outcome, with_trace)?;
            outcome.text
        }
        "set" => {
            let field: DocPath = required(args, "field")?
                .parse()
                .context("invalid field path")?;
            let value = parse_value(required(args, "value")?)?;
            let outcome =
                editor.set_field(&collection(args)?, required(args, "key")?, &field, value)?;
            if !outcome.applied {
                tracing::warn!("Field {} not set: parent is missing", field);
            }
            summarize(&outcome, with_trace)?;
            outcome.text
        }
        "create" => {
            let body = match args.get_one::<String>("body") {
                Some(raw) => parse_value(raw)?,
                None => Node::map(),
            };
            let outcome = editor.create_entity(&collection(args)?, body)?;
            summarize(&outcome, with_trace)?;
            outcome.text
        }
        "show" => {
            show(editor, args)?;
            return Ok(None);
        }
        "check" => {
            check(editor)?;
            return Ok(None);
        }
        other => bail!("unknown command '{other}'"),
    };
    Ok(Some(text))
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing <{name}>"))
}

fn collection(args: &ArgMatches) -> Result<EntityKind> {
    Ok(required(args, "collection")?.parse()?)
}

/// YAML text to a document node
fn parse_value(raw: &str) -> Result<Node> {
    let value: serde_json::Value =
        serde_yaml::from_str(raw).with_context(|| format!("invalid YAML value '{raw}'"))?;
    Ok(Node::from_json(&value))
}

/// Outcome as JSON without the document text
fn summary<T: Serialize>(outcome: &T, with_trace: bool) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(outcome)?;
    if let Some(fields) = value.as_object_mut() {
        fields.remove("text");
        if !with_trace {
            fields.remove("trace");
        }
    }
    Ok(value)
}

fn summarize<T: Serialize>(outcome: &T, with_trace: bool) -> Result<()> {
    eprintln!("{}", serde_json::to_string_pretty(&summary(outcome, with_trace)?)?);
    Ok(())
}

fn show(editor: &Editor, args: &ArgMatches) -> Result<()> {
    let path: DocPath = args
        .get_one::<String>("path")
        .map_or("", String::as_str)
        .parse()
        .context("invalid path")?;
    let Some(value) = editor.view(&path) else {
        bail!("nothing at '{path}'");
    };
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", serde_yaml::to_string(&value)?);
    }
    Ok(())
}

fn check(editor: &Editor) -> Result<()> {
    reintegrate(editor.document(), editor.config().indent)
        .context("model does not survive a write/read round trip")?;
    for (path, anchor) in editor.document().anchors() {
        println!(
            "anchor &{} at {} ({} aliases)",
            anchor,
            path,
            alias_count(editor.document(), &anchor)
        );
    }
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tme_test_utils::{ids_at, SAMPLE_MODEL};

    fn run_args(editor: &mut Editor, argv: &[&str]) -> Result<Option<String>> {
        let mut full = vec!["tme", "--model", "model.yaml"];
        full.extend_from_slice(argv);
        let matches = cli().try_get_matches_from(full)?;
        let (name, args) = matches.subcommand().context("no command")?;
        execute(editor, name, args, false)
    }

    fn sample() -> Editor {
        Editor::from_yaml(SAMPLE_MODEL, EditorConfig::default()).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn rename_returns_edited_text() {
        let mut editor = sample();
        let text = run_args(&mut editor, &["rename", "technical_assets", "web-server", "frontend"])
            .unwrap()
            .unwrap();
        assert!(text.contains("  frontend:\n    id: ta-1\n"));
    }

    #[test]
    fn delete_mode_flag_is_honoured() {
        let mut editor = sample();
        run_args(
            &mut editor,
            &["delete", "data_assets", "audit-log", "--mode", "item-only"],
        )
        .unwrap();
        assert_eq!(
            ids_at(editor.document(), "technical_assets.database.data_assets_stored"),
            vec!["da-1", "da-3"]
        );
    }

    #[test]
    fn set_parses_yaml_values() {
        let mut editor = sample();
        run_args(&mut editor, &["set", "technical_assets", "database", "tags", "[storage, sql]"]).unwrap();
        assert_eq!(ids_at(editor.document(), "tags_available"), vec!["web", "storage", "sql"]);
    }

    #[test]
    fn read_only_commands_return_nothing() {
        let mut editor = sample();
        assert!(run_args(&mut editor, &["check"]).unwrap().is_none());
        assert!(run_args(&mut editor, &["show", "data_assets.session-token", "--json"])
            .unwrap()
            .is_none());
        assert!(run_args(&mut editor, &["show", "missing"]).is_err());
    }

    #[test]
    fn edit_errors_survive_anyhow() {
        let mut editor = sample();
        let err = run_args(&mut editor, &["rename", "technical_assets", "web-server", "database"])
            .unwrap_err();
        assert!(err
            .downcast_ref::<EditError>()
            .is_some_and(EditError::is_recoverable));
    }

    #[test]
    fn summary_drops_text_and_optionally_trace() {
        let mut editor = sample();
        let outcome = editor
            .rename_entity_key(&EntityKind::DataAsset, "audit-log", "audit")
            .unwrap();
        let without = summary(&outcome, false).unwrap();
        assert!(without.get("text").is_none());
        assert!(without.get("trace").is_none());
        assert_eq!(without["new_key"], "audit");
        assert!(summary(&outcome, true).unwrap().get("trace").is_some());
    }

    #[test]
    fn unknown_collections_are_rejected() {
        let mut editor = sample();
        assert!(run_args(&mut editor, &["delete", "assets", "web-server"]).is_err());
    }
}
