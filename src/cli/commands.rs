use std::fmt::Write as _;
use std::future::Future;
use std::io::{self, BufRead, Read, Write};

use anyhow::{bail, Context, Result};
use clap::Args;
use crossterm::tty::IsTty;

use crate::api::{HttpNoteRepository, Note, NoteDraft, NoteId, NotePatch, NoteRepository};
use crate::app::App;
use crate::config::AppConfig;
use crate::search::{ListQuery, SortSpec};

const SNIPPET_CHARS: usize = 160;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Search terms, matched against title, text and tags
    #[arg()]
    pub query: Vec<String>,
    /// Sort order: updated_at, -updated_at, created_at or -created_at
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortSpec>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Note identifier
    pub id: NoteId,
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note
    pub title: String,
    /// Note body in markdown. If omitted, piped stdin is used.
    #[arg(long)]
    pub text: Option<String>,
    /// Comma separated tags
    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Note identifier
    pub id: NoteId,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub id: NoteId,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

fn parse_sort(raw: &str) -> Result<SortSpec, String> {
    SortSpec::parse_param(raw).ok_or_else(|| {
        format!("unknown sort '{raw}', expected updated_at, -updated_at, created_at or -created_at")
    })
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn list_notes(config: &AppConfig, args: ListArgs) -> Result<()> {
    let repository = HttpNoteRepository::new(&config.api)?;
    let output = block_on(run_list(&repository, config.default_sort, &args))?;
    print!("{output}");
    Ok(())
}

pub fn show_note(config: &AppConfig, args: ShowArgs) -> Result<()> {
    let repository = HttpNoteRepository::new(&config.api)?;
    let output = block_on(run_show(&repository, &args))?;
    print!("{output}");
    Ok(())
}

pub fn new_note(config: &AppConfig, mut args: NewArgs) -> Result<()> {
    if args.text.is_none() {
        args.text = read_piped_stdin()?;
    }
    let repository = HttpNoteRepository::new(&config.api)?;
    let output = block_on(run_new(&repository, &args))?;
    print!("{output}");
    Ok(())
}

pub fn edit_note(config: &AppConfig, args: EditArgs) -> Result<()> {
    let repository = HttpNoteRepository::new(&config.api)?;
    let output = block_on(run_edit(&repository, &args))?;
    print!("{output}");
    Ok(())
}

pub fn delete_note(config: &AppConfig, args: DeleteArgs) -> Result<()> {
    let repository = HttpNoteRepository::new(&config.api)?;
    if !args.yes {
        let note = block_on(async {
            repository
                .get(&args.id)
                .await
                .with_context(|| format!("fetching note #{}", args.id))
        })?;
        println!("#{}  {}", args.id, note.title);
        if !confirm(&mut io::stdin().lock(), &mut io::stdout())? {
            println!("Kept note #{}", args.id);
            return Ok(());
        }
    }
    let output = block_on(run_delete(&repository, &args.id))?;
    print!("{output}");
    Ok(())
}

pub async fn run_list(
    repository: &dyn NoteRepository,
    default_sort: SortSpec,
    args: &ListArgs,
) -> Result<String> {
    let query = ListQuery::new(args.query.join(" ").trim(), args.sort.unwrap_or(default_sort));
    let notes = repository.list(&query).await.context("listing notes")?;
    Ok(format_note_list(&notes))
}

pub async fn run_show(repository: &dyn NoteRepository, args: &ShowArgs) -> Result<String> {
    let note = repository
        .get(&args.id)
        .await
        .with_context(|| format!("fetching note #{}", args.id))?;
    Ok(format_note_detail(&note))
}

pub async fn run_new(repository: &dyn NoteRepository, args: &NewArgs) -> Result<String> {
    let draft = NoteDraft::new(
        args.title.trim(),
        args.text.clone().unwrap_or_default(),
        args.tags.clone().unwrap_or_default(),
    );
    draft.validate()?;
    let note = repository.create(&draft).await.context("creating note")?;
    Ok(format!("Created note #{}  {}\n", id_label(&note), note.title))
}

pub async fn run_edit(repository: &dyn NoteRepository, args: &EditArgs) -> Result<String> {
    let patch = build_patch(args)?;
    let note = repository
        .patch(&args.id, &patch)
        .await
        .with_context(|| format!("updating note #{}", args.id))?;
    Ok(format!("Updated note #{}  {}\n", id_label(&note), note.title))
}

pub async fn run_delete(repository: &dyn NoteRepository, id: &NoteId) -> Result<String> {
    repository
        .delete(id)
        .await
        .with_context(|| format!("deleting note #{id}"))?;
    Ok(format!("Deleted note #{id}\n"))
}

fn build_patch(args: &EditArgs) -> Result<NotePatch> {
    let patch = NotePatch {
        title: args.title.as_ref().map(|title| title.trim().to_string()),
        text: args.text.clone(),
        tags: args.tags.clone(),
    };
    if patch.is_empty() {
        bail!("nothing to change; pass --title, --text or --tags");
    }
    if patch.title.as_deref() == Some("") {
        bail!("Title is required");
    }
    Ok(patch)
}

/// Asks the delete question on `output` and reads the answer from `input`.
/// Anything but an explicit yes keeps the note.
pub fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "Delete this note? [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer).context("reading confirmation")?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn read_piped_stdin() -> Result<Option<String>> {
    let mut stdin = io::stdin();
    if stdin.is_tty() {
        return Ok(None);
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf).context("reading note text from stdin")?;
    Ok(Some(buf))
}

fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(future)
}

fn id_label(note: &Note) -> String {
    note.id
        .as_ref()
        .map(NoteId::to_string)
        .unwrap_or_else(|| "?".to_string())
}

pub fn format_note_list(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "No notes found.\n".to_string();
    }
    let mut out = String::new();
    for note in notes {
        let _ = writeln!(&mut out, "#{}  {}", id_label(note), note.title);
        let _ = writeln!(&mut out, "    updated {}", note.updated_label());
        let tags = note.display_tags();
        if !tags.is_empty() {
            let _ = writeln!(&mut out, "    tags    {}", format_tags(&tags));
        }
        if let Some(snippet) = build_snippet(&note.text, 2) {
            let _ = writeln!(&mut out, "    {snippet}");
        }
        out.push('\n');
    }
    out
}

pub fn format_note_detail(note: &Note) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "#{}  {}", id_label(note), note.title);
    let _ = writeln!(&mut out, "updated {}", note.updated_label());
    let tags = note.display_tags();
    if !tags.is_empty() {
        let _ = writeln!(&mut out, "tags    {}", format_tags(&tags));
    }
    out.push('\n');
    if note.text.trim().is_empty() {
        out.push_str("(no content)\n");
    } else {
        out.push_str(note.text.trim_end());
        out.push('\n');
    }
    out
}

fn build_snippet(text: &str, lines: usize) -> Option<String> {
    let segments: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(lines)
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join(" ").chars().take(SNIPPET_CHARS).collect())
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn note(id: i64, title: &str, text: &str, tags: &str, updated_at: Option<&str>) -> Note {
        Note {
            id: Some(NoteId::from(id)),
            title: title.to_string(),
            text: text.to_string(),
            tags: tags.to_string(),
            tags_list: Vec::new(),
            created_at: None,
            updated_at: updated_at.map(str::to_string),
        }
    }

    #[test]
    fn note_list_output() {
        let notes = vec![
            note(
                1,
                "Groceries",
                "- milk\n\n- eggs\n- bread",
                "home, errands",
                Some("2024-01-02T08:15:00Z"),
            ),
            note(2, "Empty", "", "", None),
        ];
        insta::assert_snapshot!(format_note_list(&notes), @r###"
        #1  Groceries
            updated 2024-01-02 08:15
            tags    #home #errands
            - milk - eggs

        #2  Empty
            updated never
        "###);
    }

    #[test]
    fn empty_list_says_so() {
        assert_eq!(format_note_list(&[]), "No notes found.\n");
    }

    #[test]
    fn detail_prints_body_or_placeholder() {
        let full = format_note_detail(&note(3, "Plan", "# Q3\n\nship it\n", "", Some("2024-05-01")));
        assert!(full.starts_with("#3  Plan\nupdated 2024-05-01 00:00\n\n"));
        assert!(full.ends_with("ship it\n"));

        let empty = format_note_detail(&note(4, "Blank", "  ", "x", None));
        assert!(empty.contains("tags    #x\n"));
        assert!(empty.ends_with("(no content)\n"));
    }

    #[test]
    fn confirmation_requires_explicit_yes() -> Result<()> {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("\n", false), ("nope\n", false), ("", false)] {
            let mut output = Vec::new();
            let confirmed = confirm(&mut Cursor::new(answer), &mut output)?;
            assert_eq!(confirmed, expected, "answer {answer:?}");
            assert_eq!(String::from_utf8(output)?, "Delete this note? [y/N] ");
        }
        Ok(())
    }

    #[test]
    fn edit_needs_at_least_one_field() {
        let args = EditArgs {
            id: NoteId::from(1),
            title: None,
            text: None,
            tags: None,
        };
        assert!(build_patch(&args).is_err());

        let blank_title = EditArgs {
            title: Some("  ".into()),
            ..args.clone()
        };
        assert!(build_patch(&blank_title).is_err());

        let tags_only = EditArgs {
            tags: Some("a,b".into()),
            ..args
        };
        let patch = build_patch(&tags_only).expect("patch");
        assert_eq!(patch.tags.as_deref(), Some("a,b"));
        assert!(patch.title.is_none());
    }

    #[test]
    fn sort_argument_accepts_api_values() {
        assert!(parse_sort("-created_at").is_ok());
        assert!(parse_sort("title").is_err());
    }
}
