use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles keyed by what an output line reports
#[derive(Debug, Clone)]
pub struct Theme {
    /// Banner, section titles and run directory headings
    pub heading: Style,
    /// Commits and the final "Finished." line
    pub committed: Style,
    pub failure: Style,
    pub warning: Style,
    /// Marker in front of a loaded file
    pub file: Style,
    /// Field labels in status and summary rows
    pub label: Style,
    /// Skipped files and row counts
    pub faded: Style,
}

impl Theme {
    pub fn new(colors: bool) -> Self {
        if !colors {
            let none = Style::new();
            return Self {
                heading: none,
                committed: none,
                failure: none,
                warning: none,
                file: none,
                label: none,
                faded: none,
            };
        }
        Self {
            heading: Style::new().cyan().bold(),
            committed: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            warning: Style::new().yellow().bold(),
            file: Style::new().blue(),
            label: Style::new().white().dimmed(),
            faded: Style::new().bright_black(),
        }
    }

    fn detect() -> Self {
        let set = |name: &str| std::env::var_os(name).is_some_and(|v| !v.is_empty() && v != "0");
        Self::new(colors_wanted(
            set("NO_COLOR"),
            set("CLICOLOR_FORCE"),
            console::Term::stdout().is_term(),
        ))
    }
}

/// `NO_COLOR` wins over `CLICOLOR_FORCE`, which wins over terminal detection
pub fn colors_wanted(no_color: bool, force: bool, is_term: bool) -> bool {
    !no_color && (force || is_term)
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
