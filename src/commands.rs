/// Command-mode table and suggestion ranking

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// Every command, in suggestion order for an empty line
pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home"],
    description: "Account summary",
  },
  Command {
    name: "inventory",
    aliases: &["i", "inv", "items"],
    description: "Items and sync status",
  },
  Command {
    name: "logs",
    aliases: &["l", "dungeons"],
    description: "Dungeon clear logs",
  },
  Command {
    name: "profile",
    aliases: &["p", "me"],
    description: "Public profile",
  },
  Command {
    name: "settings",
    aliases: &["s", "prefs"],
    description: "Account settings",
  },
  Command {
    name: "theme",
    aliases: &["t"],
    description: "theme <system|light|dark>",
  },
  Command {
    name: "lang",
    aliases: &["language"],
    description: "lang <ko|en>",
  },
  Command {
    name: "sync",
    aliases: &[],
    description: "Sync inventory from the game",
  },
  Command {
    name: "more",
    aliases: &["m", "next"],
    description: "Load the next page of logs",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Refetch the current screen",
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "Sign out and clear cached data",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit hoardview",
  },
];

/// How well `word` matches `cmd`; lower is better, `None` is no match.
///
/// Exact name, exact alias, name prefix, alias prefix, then substring of the
/// name or an alias.
fn rank(cmd: &Command, word: &str) -> Option<u8> {
  let aliases = cmd.aliases.iter();
  if cmd.name == word {
    Some(0)
  } else if cmd.aliases.contains(&word) {
    Some(1)
  } else if cmd.name.starts_with(word) {
    Some(2)
  } else if aliases.clone().any(|a| a.starts_with(word)) {
    Some(3)
  } else if cmd.name.contains(word) {
    Some(4)
  } else if aliases.clone().any(|a| a.contains(word)) {
    Some(5)
  } else {
    None
  }
}

/// Commands matching the typed input, best first. Ties keep table order.
///
/// Only the first word is matched, so `theme dark` still suggests `theme`.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let word = input.split_whitespace().next().unwrap_or("").to_lowercase();
  if word.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut ranked: Vec<(u8, &'static Command)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &word).map(|r| (r, cmd)))
    .collect();
  ranked.sort_by_key(|(r, _)| *r);
  ranked.into_iter().map(|(_, cmd)| cmd).collect()
}

/// Resolve submitted input into a command name and its argument.
///
/// The highlighted suggestion wins over what was typed; the argument is
/// whatever follows the first word.
pub fn resolve(input: &str, selected: usize) -> Option<(&'static str, Option<String>)> {
  let mut words = input.trim().splitn(2, char::is_whitespace);
  let typed = words.next().filter(|w| !w.is_empty());
  let argument = words
    .next()
    .map(|rest| rest.trim().to_string())
    .filter(|rest| !rest.is_empty());

  let suggestions = get_suggestions(input);
  let name = match suggestions.get(selected) {
    Some(cmd) => cmd.name,
    None => {
      let typed = typed?.to_lowercase();
      COMMANDS.iter().find(|cmd| cmd.name == typed)?.name
    }
  };
  Some((name, argument))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn first(input: &str) -> Option<&'static str> {
    get_suggestions(input).first().map(|cmd| cmd.name)
  }

  #[test]
  fn test_blank_line_lists_everything() {
    assert_eq!(get_suggestions("  ").len(), COMMANDS.len());
  }

  #[test]
  fn test_ranking() {
    assert_eq!(first("inventory"), Some("inventory"));
    assert_eq!(first("i"), Some("inventory"));
    assert_eq!(first("INV"), Some("inventory"));
    assert_eq!(first("ngs"), Some("settings"));
    assert_eq!(first("theme dark"), Some("theme"));
    assert_eq!(first("zzz"), None);
  }

  #[test]
  fn test_name_prefix_beats_alias_substring() {
    let names: Vec<&str> = get_suggestions("lo").iter().map(|cmd| cmd.name).collect();
    assert_eq!(names, vec!["logs", "logout", "refresh"]);
  }

  #[test]
  fn test_resolve_with_argument() {
    assert_eq!(resolve("theme dark", 0), Some(("theme", Some("dark".to_string()))));
    assert_eq!(resolve("lang   en  ", 0), Some(("lang", Some("en".to_string()))));
    assert_eq!(resolve("lo", 1), Some(("logout", None)));
    assert_eq!(resolve("", 0), Some(("dashboard", None)));
    assert_eq!(resolve("zzz", 0), None);
  }
}
