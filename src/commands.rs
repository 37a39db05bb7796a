//! Session commands, parsing and autocomplete logic

use color_eyre::{eyre::eyre, Result};

use crate::api::Endpoint;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "employees",
    aliases: &["e", "emps"],
    usage: "employees",
    description: "List employees (cached)",
  },
  Command {
    name: "transactions",
    aliases: &["t", "txns", "page"],
    usage: "transactions [page]",
    description: "Show a page of transactions (cached)",
  },
  Command {
    name: "employee",
    aliases: &["by"],
    usage: "employee <employee-id>",
    description: "Show transactions for one employee (cached)",
  },
  Command {
    name: "approve",
    aliases: &["a", "set"],
    usage: "approve <transaction-id> [true|false]",
    description: "Set approval on the backend and patch cached listings",
  },
  Command {
    name: "invalidate",
    aliases: &["inv", "drop"],
    usage: "invalidate <endpoint>...",
    description: "Drop cached entries for the given endpoints",
  },
  Command {
    name: "clear",
    aliases: &["c", "reset"],
    usage: "clear",
    description: "Drop every cached entry",
  },
  Command {
    name: "keys",
    aliases: &["k", "ls"],
    usage: "keys",
    description: "List cache keys",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "Show this help",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Leave the session",
  },
];

/// A parsed session command with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  Employees,
  Transactions { page: Option<u32> },
  EmployeeTransactions { employee_id: String },
  Approve { transaction_id: String, value: bool },
  Invalidate(Vec<Endpoint>),
  Clear,
  Keys,
  Help,
  Quit,
}

/// Find a command by exact name or alias
pub fn resolve(input: &str) -> Option<&'static Command> {
  let input_lower = input.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input_lower || cmd.aliases.contains(&input_lower.as_str()))
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Action>> {
  let mut words = line.split_whitespace();
  let Some(word) = words.next() else {
    return Ok(None);
  };
  let args: Vec<&str> = words.collect();

  let Some(cmd) = resolve(word) else {
    let suggestions: Vec<&str> = get_suggestions(word).iter().map(|c| c.name).collect();
    return Err(if suggestions.is_empty() {
      eyre!("Unknown command '{}'. Type 'help' for a list.", word)
    } else {
      eyre!("Unknown command '{}'. Did you mean: {}?", word, suggestions.join(", "))
    });
  };

  let action = match cmd.name {
    "employees" => Action::Employees,
    "transactions" => {
      let page = match args.first() {
        Some(p) => Some(
          p.parse::<u32>()
            .map_err(|_| eyre!("Page must be a number, got '{}'", p))?,
        ),
        None => None,
      };
      Action::Transactions { page }
    }
    "employee" => Action::EmployeeTransactions {
      employee_id: required_arg(cmd, &args, 0)?.to_string(),
    },
    "approve" => {
      let transaction_id = required_arg(cmd, &args, 0)?.to_string();
      let value = match args.get(1) {
        Some(v) => parse_bool(v)?,
        None => true,
      };
      Action::Approve {
        transaction_id,
        value,
      }
    }
    "invalidate" => {
      if args.is_empty() {
        return Err(eyre!("Usage: {}", cmd.usage));
      }
      let endpoints = args
        .iter()
        .map(|a| a.parse::<Endpoint>())
        .collect::<Result<Vec<_>>>()?;
      Action::Invalidate(endpoints)
    }
    "clear" => Action::Clear,
    "keys" => Action::Keys,
    "help" => Action::Help,
    "quit" => Action::Quit,
    other => return Err(eyre!("Command '{}' has no handler", other)),
  };

  Ok(Some(action))
}

fn required_arg<'a>(cmd: &Command, args: &[&'a str], index: usize) -> Result<&'a str> {
  args
    .get(index)
    .copied()
    .ok_or_else(|| eyre!("Usage: {}", cmd.usage))
}

fn parse_bool(s: &str) -> Result<bool> {
  match s.to_lowercase().as_str() {
    "true" | "yes" | "y" | "1" => Ok(true),
    "false" | "no" | "n" | "0" => Ok(false),
    _ => Err(eyre!("Expected true or false, got '{}'", s)),
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
