//! Command-bar commands.
//!
//! Each command is a small type implementing [`BrowserCommand`]; the
//! [`CommandRegistry`] splits the input line, applies the loading rules
//! and turns any error into the status line. `help` is answered by the
//! registry itself since it needs the full command list.

use std::collections::BTreeMap;

use baodweb_types::{BrowserError, CommandError, NavigationError, Result};

use crate::loader::HOME_URL;
use crate::session::Session;

/// Result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Nothing to report.
    None,
    /// One line for the status bar.
    Status(String),
    /// Leave the program.
    Quit,
}

/// How a command interacts with a load in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhileLoading {
    /// Starts a load of its own: rejected with `Busy`.
    Refuse,
    /// Cancel the pending load, then run.
    Cancel,
    /// Run and leave the pending load alone.
    Run,
}

/// A single command-bar command.
pub trait BrowserCommand {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "click <id>").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// What to do with `args` while a page is still loading.
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Cancel
    }

    fn execute(&self, args: &[&str], session: &mut Session) -> Result<CommandOutput>;
}

// -------------------------------------------------------------------
// Registry
// -------------------------------------------------------------------

/// Commands by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn BrowserCommand>>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.commands.keys()).finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every browser command.
    pub fn with_browser_commands() -> Self {
        let mut reg = Self::new();
        register_browser_commands(&mut reg);
        reg
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn BrowserCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn BrowserCommand> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Run one input line. Errors end up in the session's status line and
    /// come back as [`CommandOutput::Status`].
    pub fn execute(&self, line: &str, session: &mut Session) -> CommandOutput {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return CommandOutput::None;
        };
        let args: Vec<&str> = words.collect();
        log::debug!("command {name} {args:?}");
        session.clear_status();
        match self.dispatch(name, &args, session) {
            Ok(CommandOutput::Status(message)) => {
                session.set_status(message.clone());
                CommandOutput::Status(message)
            },
            Ok(output) => output,
            Err(e) => {
                log::debug!("{name}: {e}");
                let message = e.to_string();
                session.set_status(message.clone());
                CommandOutput::Status(message)
            },
        }
    }

    fn dispatch(&self, name: &str, args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        if name == "help" {
            if session.is_loading() {
                session.cancel();
            }
            return self.help(args);
        }
        let cmd = self
            .commands
            .get(name)
            .ok_or_else(|| CommandError::Unknown(name.to_string()))?;
        if session.is_loading() {
            match cmd.while_loading(args) {
                WhileLoading::Refuse => return Err(NavigationError::Busy.into()),
                WhileLoading::Cancel => {
                    session.cancel();
                },
                WhileLoading::Run => {},
            }
        }
        cmd.execute(args, session)
    }

    fn help(&self, args: &[&str]) -> Result<CommandOutput> {
        match args {
            [] => {
                let names: Vec<&str> = self.names().chain(["help"]).collect();
                Ok(CommandOutput::Status(format!(
                    "commands: {} (help <command> for details)",
                    names.join(", ")
                )))
            },
            [name] => {
                let cmd = self
                    .get(name)
                    .ok_or_else(|| CommandError::Unknown((*name).to_string()))?;
                Ok(CommandOutput::Status(format!(
                    "{} -- {} [{}]",
                    cmd.usage(),
                    cmd.description(),
                    cmd.category()
                )))
            },
            _ => Err(usage("help [command]")),
        }
    }
}

/// Register all browser commands into a registry.
pub fn register_browser_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(GoCmd));
    reg.register(Box::new(ClickCmd));
    reg.register(Box::new(BackCmd));
    reg.register(Box::new(ReloadCmd));
    reg.register(Box::new(HomeCmd));
    reg.register(Box::new(SourceCmd));
    reg.register(Box::new(TestCmd));
    reg.register(Box::new(ListTestsCmd));
    reg.register(Box::new(ListLanguagesCmd));
    reg.register(Box::new(GenerateCmd));
    reg.register(Box::new(ConfigCmd));
    reg.register(Box::new(ScrollCmd::Up));
    reg.register(Box::new(ScrollCmd::Down));
    reg.register(Box::new(ScrollCmd::Top));
    reg.register(Box::new(ScrollCmd::Bottom));
    reg.register(Box::new(StopCmd));
    reg.register(Box::new(QuitCmd));
}

fn usage(text: &str) -> BrowserError {
    CommandError::Usage(text.to_string()).into()
}

// -------------------------------------------------------------------
// Navigation
// -------------------------------------------------------------------

struct GoCmd;

impl BrowserCommand for GoCmd {
    fn name(&self) -> &str {
        "go"
    }
    fn description(&self) -> &str {
        "Open a URL, a path, or a link relative to the current page"
    }
    fn usage(&self) -> &str {
        "go <url>"
    }
    fn category(&self) -> &str {
        "navigation"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        match args {
            [url] => session.go(url).map(|()| CommandOutput::None),
            _ => Err(usage(self.usage())),
        }
    }
}

struct ClickCmd;

impl BrowserCommand for ClickCmd {
    fn name(&self) -> &str {
        "click"
    }
    fn description(&self) -> &str {
        "Follow the link tagged [id]"
    }
    fn usage(&self) -> &str {
        "click <id>"
    }
    fn category(&self) -> &str {
        "navigation"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        let [id] = args else {
            return Err(usage(self.usage()));
        };
        let id: u32 = id.parse().map_err(|_| usage(self.usage()))?;
        session.click(id)?;
        Ok(CommandOutput::None)
    }
}

struct BackCmd;

impl BrowserCommand for BackCmd {
    fn name(&self) -> &str {
        "back"
    }
    fn description(&self) -> &str {
        "Return to the previous page"
    }
    fn usage(&self) -> &str {
        "back"
    }
    fn category(&self) -> &str {
        "navigation"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, _args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        session.back()?;
        Ok(CommandOutput::None)
    }
}

struct ReloadCmd;

impl BrowserCommand for ReloadCmd {
    fn name(&self) -> &str {
        "reload"
    }
    fn description(&self) -> &str {
        "Fetch the current page again"
    }
    fn usage(&self) -> &str {
        "reload"
    }
    fn category(&self) -> &str {
        "navigation"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, _args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        session.reload()?;
        Ok(CommandOutput::None)
    }
}

struct HomeCmd;

impl BrowserCommand for HomeCmd {
    fn name(&self) -> &str {
        "home"
    }
    fn description(&self) -> &str {
        "Open the start page"
    }
    fn usage(&self) -> &str {
        "home"
    }
    fn category(&self) -> &str {
        "navigation"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, _args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        session.go(HOME_URL)?;
        Ok(CommandOutput::None)
    }
}

struct StopCmd;

impl BrowserCommand for StopCmd {
    fn name(&self) -> &str {
        "stop"
    }
    fn description(&self) -> &str {
        "Cancel the page being loaded"
    }
    fn usage(&self) -> &str {
        "stop"
    }
    fn category(&self) -> &str {
        "navigation"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Run
    }
    fn execute(&self, _args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        if session.cancel() {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Status("nothing to stop".into()))
        }
    }
}

// -------------------------------------------------------------------
// Pages
// -------------------------------------------------------------------

struct SourceCmd;

impl BrowserCommand for SourceCmd {
    fn name(&self) -> &str {
        "source"
    }
    fn description(&self) -> &str {
        "Toggle between the page and its markup"
    }
    fn usage(&self) -> &str {
        "source"
    }
    fn category(&self) -> &str {
        "pages"
    }
    fn execute(&self, _args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        if session.page().is_none() {
            return Ok(CommandOutput::Status("no page loaded".into()));
        }
        let message = if session.toggle_source() {
            "showing source"
        } else {
            "showing page"
        };
        Ok(CommandOutput::Status(message.into()))
    }
}

struct TestCmd;

impl BrowserCommand for TestCmd {
    fn name(&self) -> &str {
        "test"
    }
    fn description(&self) -> &str {
        "Open a page from test-pages/ in the current language"
    }
    fn usage(&self) -> &str {
        "test <page>"
    }
    fn category(&self) -> &str {
        "pages"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        let [page] = args else {
            return Err(usage(self.usage()));
        };
        let page = page.strip_suffix(".html").unwrap_or(*page);
        session.go(&format!("test:{page}"))?;
        Ok(CommandOutput::None)
    }
}

struct ListTestsCmd;

impl BrowserCommand for ListTestsCmd {
    fn name(&self) -> &str {
        "list-tests"
    }
    fn description(&self) -> &str {
        "List the available test pages"
    }
    fn usage(&self) -> &str {
        "list-tests"
    }
    fn category(&self) -> &str {
        "pages"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, _args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        session.go("about:tests")?;
        Ok(CommandOutput::None)
    }
}

struct ListLanguagesCmd;

impl BrowserCommand for ListLanguagesCmd {
    fn name(&self) -> &str {
        "list-languages"
    }
    fn description(&self) -> &str {
        "List the languages that have a start page"
    }
    fn usage(&self) -> &str {
        "list-languages"
    }
    fn category(&self) -> &str {
        "pages"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, _args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        session.go("about:languages")?;
        Ok(CommandOutput::None)
    }
}

struct GenerateCmd;

impl BrowserCommand for GenerateCmd {
    fn name(&self) -> &str {
        "generate"
    }
    fn description(&self) -> &str {
        "Open a generated page exercising one tag"
    }
    fn usage(&self) -> &str {
        "generate <tag>"
    }
    fn category(&self) -> &str {
        "pages"
    }
    fn while_loading(&self, _args: &[&str]) -> WhileLoading {
        WhileLoading::Refuse
    }
    fn execute(&self, args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        let [tag] = args else {
            return Err(usage(self.usage()));
        };
        let tag = tag.trim_matches(['<', '>']).to_ascii_lowercase();
        session.go(&format!("about:generate/{tag}"))?;
        Ok(CommandOutput::None)
    }
}

// -------------------------------------------------------------------
// Settings
// -------------------------------------------------------------------

struct ConfigCmd;

impl BrowserCommand for ConfigCmd {
    fn name(&self) -> &str {
        "config"
    }
    fn description(&self) -> &str {
        "Show the settings, or change one"
    }
    fn usage(&self) -> &str {
        "config | config <key> | config <key> <value>"
    }
    fn category(&self) -> &str {
        "settings"
    }
    fn while_loading(&self, args: &[&str]) -> WhileLoading {
        // Only the bare form opens a page.
        if args.is_empty() {
            WhileLoading::Refuse
        } else {
            WhileLoading::Cancel
        }
    }
    fn execute(&self, args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        match args {
            [] => {
                session.go("about:config")?;
                Ok(CommandOutput::None)
            },
            [key] => {
                let value = session.config().get(key)?;
                Ok(CommandOutput::Status(format!("{key} = {value}")))
            },
            [key, value] => {
                session.set_config(key, value)?;
                let value = session.config().get(key)?;
                Ok(CommandOutput::Status(format!("{key} = {value}")))
            },
            _ => Err(usage(self.usage())),
        }
    }
}

// -------------------------------------------------------------------
// Scrolling
// -------------------------------------------------------------------

enum ScrollCmd {
    Up,
    Down,
    Top,
    Bottom,
}

impl BrowserCommand for ScrollCmd {
    fn name(&self) -> &str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
    fn description(&self) -> &str {
        match self {
            Self::Up => "Scroll up n lines (default: one page)",
            Self::Down => "Scroll down n lines (default: one page)",
            Self::Top => "Scroll to the top of the page",
            Self::Bottom => "Scroll to the end of the page",
        }
    }
    fn usage(&self) -> &str {
        match self {
            Self::Up => "up [n]",
            Self::Down => "down [n]",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
    fn category(&self) -> &str {
        "view"
    }
    fn execute(&self, args: &[&str], session: &mut Session) -> Result<CommandOutput> {
        let lines = match args {
            [] => None,
            [n] => Some(n.parse::<usize>().map_err(|_| usage(self.usage()))?),
            _ => return Err(usage(self.usage())),
        };
        let view = session.viewport_mut();
        match (self, lines) {
            (Self::Up, Some(n)) => view.scroll_up(n),
            (Self::Up, None) => view.page_up(),
            (Self::Down, Some(n)) => view.scroll_down(n),
            (Self::Down, None) => view.page_down(),
            (Self::Top, _) => view.scroll_to_top(),
            (Self::Bottom, _) => view.scroll_to_bottom(),
        }
        Ok(CommandOutput::None)
    }
}

struct QuitCmd;

impl BrowserCommand for QuitCmd {
    fn name(&self) -> &str {
        "quit"
    }
    fn description(&self) -> &str {
        "Exit the browser"
    }
    fn usage(&self) -> &str {
        "quit"
    }
    fn execute(&self, _args: &[&str], _session: &mut Session) -> Result<CommandOutput> {
        Ok(CommandOutput::Quit)
    }
}
