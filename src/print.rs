//! Layout of rendered commands: indentation, line wrapping, and terminal styling.

use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

use itertools::Itertools;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;
use owo_colors::Style;

use crate::command::ArgEntry;
use crate::command::Command;
use crate::escape::escape;
use crate::escape::QuoteMode;

/// An unrecognized value was supplied for an enumerated option.
///
/// This is a programmer error, not a data error; unknown option values are rejected rather than
/// silently replaced with a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The name of the option.
    option: &'static str,
    /// The unrecognized value.
    value: String,
    /// The values the option accepts.
    expected: &'static [&'static str],
}

impl ConfigError {
    pub(crate) fn new(option: &'static str, value: &str, expected: &'static [&'static str]) -> Self {
        Self {
            option,
            value: value.to_owned(),
            expected,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unrecognized value {:?} for `{}`; expected one of {}",
            self.value,
            self.option,
            self.expected.iter().map(|value| format!("{value:?}")).join(", ")
        )
    }
}

impl Error for ConfigError {}

impl miette::Diagnostic for ConfigError {}

/// How rendered argument entries are split across backslash-continuation lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineWrapping {
    /// One entry per line; the members of a group share a line.
    #[default]
    ByEntry,
    /// One entry per line, with each group member on its own line, indented one extra level.
    NestedByEntry,
    /// Every token on its own line, grouped or not.
    ByArgument,
    /// Everything on one line, no continuations.
    Inline,
}

impl FromStr for LineWrapping {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "by-entry" => Ok(Self::ByEntry),
            "nested-by-entry" => Ok(Self::NestedByEntry),
            "by-argument" => Ok(Self::ByArgument),
            "inline" => Ok(Self::Inline),
            _ => Err(ConfigError::new(
                "argument-line-wrapping",
                value,
                &["by-entry", "nested-by-entry", "by-argument", "inline"],
            )),
        }
    }
}

/// Options for [`Command::render`]. This is like a lower-effort builder interface, mostly
/// provided because Rust tragically lacks named arguments.
///
/// Options are supplied per call and never mutated; `PrintOptions::default()` gives the standard
/// layout (no main indentation, two-space argument indentation, automatic quoting, wrapping by
/// entry).
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Indentation prefix for the first line.
    pub main_indent: String,
    /// Additional indentation for continuation lines, appended to `main_indent`.
    pub arg_indent: String,
    /// Quoting policy for every rendered token.
    pub quoting: QuoteMode,
    /// Where continuation-line breaks are inserted.
    pub line_wrapping: LineWrapping,
    /// Keep the first entry on the command's own line instead of wrapping before it.
    pub skip_line_wrap_before_first_arg: bool,
    /// A terminal style applied to the finished text as a purely cosmetic final pass.
    ///
    /// Styling never participates in quoting or layout decisions.
    pub style: Option<Style>,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            main_indent: String::new(),
            arg_indent: "  ".to_owned(),
            quoting: QuoteMode::default(),
            line_wrapping: LineWrapping::default(),
            skip_line_wrap_before_first_arg: false,
            style: None,
        }
    }
}

impl Command {
    /// Render this command as safely-escaped, copy-pasteable shell text.
    ///
    /// The rendered tokens come from the same flattening that
    /// [`Command::command_and_flat_args`] hands to the spawn facility, so the printed command and
    /// the executed command cannot diverge. The result never ends in a newline.
    pub fn render(&self, options: &PrintOptions) -> String {
        let arg_indent = format!("{}{}", options.main_indent, options.arg_indent);
        // A trailing backslash continues the logical shell line.
        let wrap = format!(" \\\n{arg_indent}");

        let (within_group, between_entries) = match options.line_wrapping {
            LineWrapping::ByEntry => (" ".to_owned(), wrap.clone()),
            LineWrapping::NestedByEntry => (format!("{wrap}{}", options.arg_indent), wrap),
            LineWrapping::ByArgument => (wrap.clone(), wrap),
            LineWrapping::Inline => (" ".to_owned(), " ".to_owned()),
        };

        let mut rendered = format!(
            "{}{}",
            options.main_indent,
            escape(self.program(), true, options.quoting)
        );

        if !self.args().is_empty() {
            if options.skip_line_wrap_before_first_arg {
                rendered.push(' ');
            } else {
                rendered.push_str(&between_entries);
            }

            let entries = self
                .args()
                .iter()
                .map(|entry| match entry {
                    ArgEntry::Scalar(value) => escape(value, false, options.quoting),
                    ArgEntry::Group(values) => values
                        .iter()
                        .map(|value| escape(value, false, options.quoting))
                        .join(&within_group),
                })
                .join(&between_entries);
            rendered.push_str(&entries);
        }

        match options.style {
            Some(style) => style.style(rendered).to_string(),
            None => rendered,
        }
    }

    /// Write [`Command::render`]'s output to stderr, followed by a newline.
    ///
    /// When no explicit style is requested, the text is emboldened only if stderr is an
    /// interactive terminal.
    pub fn display_to_stderr(&self, options: &PrintOptions) {
        let rendered = self.render(options);
        if options.style.is_some() {
            eprintln!("{rendered}");
        } else {
            eprintln!(
                "{}",
                rendered.if_supports_color(Stderr, |text| text.bold())
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use crate::command::ArgEntry;
    use crate::command::Command;

    use super::*;

    fn rsync() -> Command {
        Command::new(
            "rsync",
            [
                ArgEntry::scalar("-avz"),
                ArgEntry::group(["--exclude", ".DS_Store"]),
                ArgEntry::group(["--exclude", ".git"]),
                ArgEntry::scalar("./dist/site/deploy/"),
                ArgEntry::scalar("host:~/deploy/"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_render_by_entry() {
        assert_eq!(
            rsync().render(&PrintOptions::default()),
            indoc!(
                r"
                rsync \
                  -avz \
                  --exclude .DS_Store \
                  --exclude .git \
                  ./dist/site/deploy/ \
                  host:~/deploy/"
            )
        );
    }

    #[test]
    fn test_render_nested_by_entry() {
        let options = PrintOptions {
            line_wrapping: LineWrapping::NestedByEntry,
            ..Default::default()
        };
        expect![[r"
            rsync \
              -avz \
              --exclude \
                .DS_Store \
              --exclude \
                .git \
              ./dist/site/deploy/ \
              host:~/deploy/"]]
        .assert_eq(&rsync().render(&options));
    }

    #[test]
    fn test_render_by_argument() {
        let options = PrintOptions {
            line_wrapping: LineWrapping::ByArgument,
            ..Default::default()
        };
        expect![[r"
            rsync \
              -avz \
              --exclude \
              .DS_Store \
              --exclude \
              .git \
              ./dist/site/deploy/ \
              host:~/deploy/"]]
        .assert_eq(&rsync().render(&options));
    }

    #[test]
    fn test_render_inline() {
        let options = PrintOptions {
            line_wrapping: LineWrapping::Inline,
            ..Default::default()
        };
        let rendered = rsync().render(&options);
        assert_eq!(
            rendered,
            "rsync -avz --exclude .DS_Store --exclude .git ./dist/site/deploy/ host:~/deploy/"
        );
        assert!(!rendered.contains('\\'));
    }

    #[test]
    fn test_render_quotes_special_tokens() {
        let command = Command::new(
            "echo",
            [
                ArgEntry::scalar("a b"),
                ArgEntry::scalar("$HOME"),
                ArgEntry::scalar("plain"),
            ],
        )
        .unwrap();
        let options = PrintOptions {
            line_wrapping: LineWrapping::Inline,
            ..Default::default()
        };
        assert_eq!(command.render(&options), "echo 'a b' '$HOME' plain");
    }

    #[test]
    fn test_render_extra_safe() {
        let command =
            Command::new("echo", [ArgEntry::scalar("plain")]).unwrap();
        let options = PrintOptions {
            quoting: QuoteMode::ExtraSafe,
            line_wrapping: LineWrapping::Inline,
            ..Default::default()
        };
        assert_eq!(command.render(&options), "'echo' 'plain'");
    }

    #[test]
    fn test_render_env_var_lookalike_command_name() {
        let command = Command::new("THIS_LOOKS_LIKE_AN=env-var", []).unwrap();
        assert_eq!(
            command.render(&PrintOptions::default()),
            "'THIS_LOOKS_LIKE_AN=env-var'"
        );
    }

    #[test]
    fn test_render_no_args_no_trailing_separator() {
        let command = Command::new("ls", []).unwrap();
        let options = PrintOptions {
            skip_line_wrap_before_first_arg: true,
            ..Default::default()
        };
        assert_eq!(command.render(&options), "ls");
    }

    #[test]
    fn test_render_skip_line_wrap_before_first_arg() {
        let command = Command::new(
            "git",
            [ArgEntry::scalar("status"), ArgEntry::scalar("--short")],
        )
        .unwrap();
        let options = PrintOptions {
            skip_line_wrap_before_first_arg: true,
            ..Default::default()
        };
        assert_eq!(
            command.render(&options),
            indoc!(
                r"
                git status \
                  --short"
            )
        );
    }

    #[test]
    fn test_render_main_indent() {
        let command = Command::new(
            "git",
            [ArgEntry::scalar("status")],
        )
        .unwrap();
        let options = PrintOptions {
            main_indent: "    ".to_owned(),
            ..Default::default()
        };
        assert_eq!(command.render(&options), "    git \\\n      status");
    }

    #[test]
    fn test_render_never_ends_in_newline() {
        for line_wrapping in [
            LineWrapping::ByEntry,
            LineWrapping::NestedByEntry,
            LineWrapping::ByArgument,
            LineWrapping::Inline,
        ] {
            let options = PrintOptions {
                line_wrapping,
                ..Default::default()
            };
            assert!(!rsync().render(&options).ends_with('\n'));
        }
    }

    #[test]
    fn test_style_wraps_finished_text() {
        let command = Command::new("ls", []).unwrap();
        let options = PrintOptions {
            style: Some(Style::new().bold()),
            ..Default::default()
        };
        let rendered = command.render(&options);
        // The styling codes surround the laid-out text; they never interact with quoting.
        assert_eq!(rendered, format!("\x1b[1m{}\x1b[0m", "ls"));
    }

    #[test]
    fn test_line_wrapping_from_str() {
        assert_eq!(
            "nested-by-entry".parse::<LineWrapping>().unwrap(),
            LineWrapping::NestedByEntry
        );
        let err = "by-paragraph".parse::<LineWrapping>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unrecognized value \"by-paragraph\" for `argument-line-wrapping`; \
             expected one of \"by-entry\", \"nested-by-entry\", \"by-argument\", \"inline\""
        );
    }
}
