use crate::cli::Commands;
use crate::utils::{resolve_snippet, short_id};
use cmdbar_core::{
    run_in_terminal, CmdbarError, CommandRunner, Result, RunEvent, Snippet, SnippetStore,
    TemplateId,
};
use cmdbar_ui::display_snippet_browser;
use std::collections::HashMap;

pub fn handle_command(command: Option<Commands>) -> Result<()> {
    let mut store = SnippetStore::open_default();

    match command {
        Some(command) => handle_subcommand(&mut store, command),
        None => display_main_ui(&mut store), // Default: show the browser UI
    }
}

fn display_main_ui(store: &mut SnippetStore) -> Result<()> {
    display_snippet_browser(store)
}

fn handle_subcommand(store: &mut SnippetStore, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            name,
            command,
            category,
            description,
            tag,
        } => handle_add(store, name, command, category, description, tag),
        Commands::New {
            template,
            vars,
            name,
            category,
            description,
        } => handle_new(store, template, vars, name, category, description),
        Commands::Templates => handle_templates(),
        Commands::List { query, category } => handle_list(store, query, category),
        Commands::Show { target } => handle_show(store, &target),
        Commands::Delete { target } => handle_delete(store, &target),
        Commands::Run {
            target,
            terminal,
            line,
        } => handle_run(store, &target, terminal, line),
    }
}

fn handle_add(
    store: &mut SnippetStore,
    name: String,
    commands: Vec<String>,
    category: String,
    description: String,
    tags: Vec<String>,
) -> Result<()> {
    let commands: Vec<String> = commands.into_iter().filter(|c| !c.trim().is_empty()).collect();
    if commands.is_empty() {
        return Err(CmdbarError::Other(
            "A snippet needs at least one non-empty command".to_string(),
        ));
    }

    store.add(Snippet::new(name, description, category, commands, tags))?;
    println!("Snippet added successfully");
    Ok(())
}

fn handle_new(
    store: &mut SnippetStore,
    template: String,
    vars: Vec<(String, String)>,
    name: Option<String>,
    category: String,
    description: String,
) -> Result<()> {
    let Some(template) = TemplateId::parse(&template) else {
        return Err(CmdbarError::Other(format!(
            "Unknown template '{}'. Try `cmdbar templates`.",
            template
        )));
    };

    let values: HashMap<String, String> = vars.into_iter().collect();
    let expanded = template.expand(&values);
    let commands: Vec<String> = expanded
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();

    if commands.is_empty() {
        return Err(CmdbarError::Other(format!(
            "Template '{}' expanded to no commands; use `cmdbar add` instead",
            template.id()
        )));
    }

    let name = name.unwrap_or_else(|| template.label().to_string());
    println!("{}", expanded);
    store.add(Snippet::new(name, description, category, commands, vec![]))?;
    println!("\nSnippet added successfully");
    Ok(())
}

fn handle_templates() -> Result<()> {
    for template in TemplateId::all() {
        let variables = template.variables();
        if variables.is_empty() {
            println!("{:<8} {}", template.id(), template.label());
        } else {
            println!(
                "{:<8} {} (variables: {})",
                template.id(),
                template.label(),
                variables.join(", ")
            );
        }
    }
    Ok(())
}

fn handle_list(
    store: &SnippetStore,
    query: Option<String>,
    category: Option<String>,
) -> Result<()> {
    let query = query.unwrap_or_default();
    let snippets: Vec<_> = store
        .filter(&query)
        .into_iter()
        .filter(|s| category.as_deref().map_or(true, |c| s.category == c))
        .collect();

    if snippets.is_empty() {
        println!("No snippets found.");
        return Ok(());
    }

    println!(
        "{:<10} {:<28} {:<14} {:>4}  {}",
        "ID", "NAME", "CATEGORY", "CMDS", "MODIFIED"
    );
    for snippet in snippets {
        println!(
            "{:<10} {:<28} {:<14} {:>4}  {}",
            short_id(snippet.id),
            snippet.name,
            snippet.category,
            snippet.commands.len(),
            snippet.formatted_age()
        );
    }
    Ok(())
}

fn handle_show(store: &SnippetStore, target: &str) -> Result<()> {
    let id = resolve_snippet(store, target)?;
    let snippet = store
        .get(id)
        .ok_or_else(|| CmdbarError::NotFound(target.to_string()))?;

    println!("{} ({})", snippet.name, snippet.id);
    if !snippet.description.is_empty() {
        println!("{}", snippet.description);
    }
    println!("category: {}", snippet.category);
    if !snippet.tags.is_empty() {
        println!("tags: {}", snippet.tags.join(", "));
    }
    println!("created: {}", snippet.date_created.to_rfc3339());
    println!("modified: {}", snippet.last_modified.to_rfc3339());
    println!();
    for command in &snippet.commands {
        println!("  {}", command);
    }
    Ok(())
}

fn handle_delete(store: &mut SnippetStore, target: &str) -> Result<()> {
    let id = resolve_snippet(store, target)?;
    store.delete(id)?;
    println!("Snippet deleted successfully");
    Ok(())
}

fn handle_run(
    store: &SnippetStore,
    target: &str,
    terminal: bool,
    line: Option<usize>,
) -> Result<()> {
    let id = resolve_snippet(store, target)?;
    let snippet = store
        .get(id)
        .ok_or_else(|| CmdbarError::NotFound(target.to_string()))?;

    let block = command_selection(snippet, line)?;

    if terminal {
        run_in_terminal(&block)?;
        println!("Sent to terminal: {}", snippet.name);
        return Ok(());
    }

    let runner = CommandRunner::new();
    let handle = runner.start(&block)?;
    for event in handle.events() {
        match event {
            RunEvent::Output(line) => println!("{}", line),
            RunEvent::Finished(0) => break,
            RunEvent::Finished(code) => {
                return Err(CmdbarError::Other(format!(
                    "Command exited with code {}",
                    code
                )))
            }
            RunEvent::Failed(message) => return Err(CmdbarError::Other(message)),
        }
    }
    Ok(())
}

/// The command block to run: the whole snippet, or one 1-based line
fn command_selection(snippet: &Snippet, line: Option<usize>) -> Result<String> {
    match line {
        Some(n) => n
            .checked_sub(1)
            .and_then(|i| snippet.commands.get(i))
            .cloned()
            .ok_or_else(|| {
                CmdbarError::Other(format!(
                    "'{}' has {} command lines, no line {}",
                    snippet.name,
                    snippet.commands.len(),
                    n
                ))
            }),
        None => Ok(snippet.command_block()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snippet {
        Snippet::new(
            "release".to_string(),
            String::new(),
            "ops".to_string(),
            vec!["make build".to_string(), "make push".to_string()],
            vec![],
        )
    }

    #[test]
    fn no_line_runs_the_whole_block() {
        assert_eq!(
            command_selection(&sample(), None).unwrap(),
            "make build\nmake push"
        );
    }

    #[test]
    fn line_is_one_based() {
        assert_eq!(command_selection(&sample(), Some(2)).unwrap(), "make push");
    }

    #[test]
    fn line_zero_is_rejected() {
        assert!(command_selection(&sample(), Some(0)).is_err());
    }

    #[test]
    fn line_past_the_end_is_rejected() {
        assert!(command_selection(&sample(), Some(3)).is_err());
    }
}
