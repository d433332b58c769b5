use crate::common::{show_message, with_terminal, UiTerminal};
use cmdbar_core::{Result, Snippet, SnippetStore, TemplateId};
use crossterm::event::{self, Event, KeyCode};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use std::collections::HashMap;
use std::time::Duration;

pub enum AddResult {
    Added,
    Cancelled,
}

#[derive(Clone, Copy, PartialEq)]
enum Step {
    PickTemplate,
    FillField(usize),
    EditCommands,
    Preview,
}

enum FieldKind {
    Variable(&'static str),
    Name,
    Category,
    Description,
}

struct Field {
    kind: FieldKind,
    label: String,
    value: String,
}

struct AddForm {
    template: TemplateId,
    fields: Vec<Field>,
    manual_commands: Vec<String>,
    command_input: String,
}

impl AddForm {
    fn new(template: TemplateId) -> Self {
        let mut fields: Vec<Field> = template
            .variables()
            .iter()
            .map(|name| Field {
                kind: FieldKind::Variable(name),
                label: format!("Template variable: {}", name),
                value: String::new(),
            })
            .collect();
        fields.push(Field {
            kind: FieldKind::Name,
            label: "Snippet name".to_string(),
            value: String::new(),
        });
        fields.push(Field {
            kind: FieldKind::Category,
            label: "Category".to_string(),
            value: "general".to_string(),
        });
        fields.push(Field {
            kind: FieldKind::Description,
            label: "Description".to_string(),
            value: String::new(),
        });

        Self {
            template,
            fields,
            manual_commands: Vec::new(),
            command_input: String::new(),
        }
    }

    fn field_text(&self, kind: fn(&FieldKind) -> bool) -> String {
        self.fields
            .iter()
            .find(|f| kind(&f.kind))
            .map(|f| f.value.clone())
            .unwrap_or_default()
    }

    fn name(&self) -> String {
        let name = self.field_text(|k| matches!(k, FieldKind::Name));
        if name.trim().is_empty() {
            self.template.label().to_string()
        } else {
            name
        }
    }

    fn category(&self) -> String {
        let category = self.field_text(|k| matches!(k, FieldKind::Category));
        if category.trim().is_empty() {
            "general".to_string()
        } else {
            category
        }
    }

    fn description(&self) -> String {
        self.field_text(|k| matches!(k, FieldKind::Description))
    }

    /// Commands for the snippet: template expansion with the supplied
    /// variable values, or the hand-entered lines for the blank template.
    /// Unfilled variables stay as `{tokens}` to flag the gap.
    fn commands(&self) -> Vec<String> {
        if self.template == TemplateId::Blank {
            return self.manual_commands.clone();
        }

        let values: HashMap<String, String> = self
            .fields
            .iter()
            .filter_map(|f| match f.kind {
                FieldKind::Variable(name) if !f.value.trim().is_empty() => {
                    Some((name.to_string(), f.value.clone()))
                }
                _ => None,
            })
            .collect();

        self.template
            .expand(&values)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Interactively build a snippet from a template and save it
pub fn interactive_add(store: &mut SnippetStore) -> Result<AddResult> {
    with_terminal(|terminal| run_add_flow(terminal, store))
}

fn run_add_flow(terminal: &mut UiTerminal, store: &mut SnippetStore) -> Result<AddResult> {
    let mut step = Step::PickTemplate;
    let mut picker_index = 0usize;
    let mut form: Option<AddForm> = None;
    let mut error: Option<String> = None;

    loop {
        match (&step, &form) {
            (Step::PickTemplate, _) => draw_picker(terminal, picker_index)?,
            (Step::FillField(i), Some(form)) => draw_field(terminal, form, *i)?,
            (Step::EditCommands, Some(form)) => {
                draw_commands(terminal, form, error.as_deref())?
            }
            (Step::Preview, Some(form)) => draw_preview(terminal, form, error.as_deref())?,
            _ => unreachable!("form exists after template selection"),
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        error = None;

        match step {
            Step::PickTemplate => match key.code {
                KeyCode::Esc => return Ok(AddResult::Cancelled),
                KeyCode::Up => picker_index = picker_index.saturating_sub(1),
                KeyCode::Down => {
                    if picker_index + 1 < TemplateId::all().len() {
                        picker_index += 1;
                    }
                }
                KeyCode::Enter => {
                    let template = TemplateId::all()[picker_index];
                    form = Some(AddForm::new(template));
                    step = Step::FillField(0);
                }
                _ => {}
            },
            Step::FillField(i) => {
                let form = form.as_mut().expect("form set before field entry");
                match key.code {
                    KeyCode::Esc => {
                        step = if i == 0 {
                            form.fields.iter_mut().for_each(|f| f.value.clear());
                            Step::PickTemplate
                        } else {
                            Step::FillField(i - 1)
                        };
                    }
                    KeyCode::Enter => {
                        step = if i + 1 < form.fields.len() {
                            Step::FillField(i + 1)
                        } else if form.template == TemplateId::Blank {
                            Step::EditCommands
                        } else {
                            Step::Preview
                        };
                    }
                    KeyCode::Backspace => {
                        form.fields[i].value.pop();
                    }
                    KeyCode::Char(c) => form.fields[i].value.push(c),
                    _ => {}
                }
            }
            Step::EditCommands => {
                let form = form.as_mut().expect("form set before command entry");
                match key.code {
                    KeyCode::Esc => step = Step::FillField(form.fields.len() - 1),
                    KeyCode::Enter => {
                        let line = form.command_input.trim().to_string();
                        if !line.is_empty() {
                            form.manual_commands.push(line);
                            form.command_input.clear();
                        } else if form.manual_commands.is_empty() {
                            error = Some("Enter at least one command".to_string());
                        } else {
                            step = Step::Preview;
                        }
                    }
                    KeyCode::Backspace => {
                        if form.command_input.is_empty() {
                            form.manual_commands.pop();
                        } else {
                            form.command_input.pop();
                        }
                    }
                    KeyCode::Char(c) => form.command_input.push(c),
                    _ => {}
                }
            }
            Step::Preview => {
                let form_ref = form.as_ref().expect("form set before preview");
                match key.code {
                    KeyCode::Esc => {
                        step = if form_ref.template == TemplateId::Blank {
                            Step::EditCommands
                        } else {
                            Step::FillField(form_ref.fields.len() - 1)
                        };
                    }
                    KeyCode::Enter => {
                        let commands = form_ref.commands();
                        if commands.is_empty() {
                            error = Some("The snippet has no commands".to_string());
                            continue;
                        }
                        store.add(Snippet::new(
                            form_ref.name(),
                            form_ref.description(),
                            form_ref.category(),
                            commands,
                            vec![],
                        ))?;
                        show_message(terminal, "Snippet added", Color::Green)?;
                        return Ok(AddResult::Added);
                    }
                    _ => {}
                }
            }
        }
    }
}

fn draw_picker(terminal: &mut UiTerminal, selected: usize) -> Result<()> {
    terminal.draw(|f| {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(1)])
            .split(size);

        let items: Vec<ListItem> = TemplateId::all()
            .iter()
            .enumerate()
            .map(|(i, template)| {
                let prefix = if i == selected { "> " } else { "  " };
                let line = Line::from(vec![
                    Span::styled(
                        format!("{}{:<8}", prefix, template.id()),
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(template.label()),
                ]);
                if i == selected {
                    ListItem::new(line).style(Style::default().bg(Color::DarkGray))
                } else {
                    ListItem::new(line)
                }
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Choose a template "),
        );
        f.render_widget(list, chunks[0]);

        let help = Paragraph::new("Up/Down select | Enter choose | Esc cancel")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[1]);
    })?;
    Ok(())
}

fn draw_field(terminal: &mut UiTerminal, form: &AddForm, index: usize) -> Result<()> {
    terminal.draw(|f| {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Input
                Constraint::Min(5),    // Placeholder / progress
                Constraint::Length(1), // Help
            ])
            .split(size);

        let field = &form.fields[index];
        let input = Paragraph::new(field.value.clone())
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", field.label)),
            );
        f.render_widget(input, chunks[0]);

        let preview = Paragraph::new(form.template.placeholder())
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(Color::Gray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} template ", form.template.id())),
            );
        f.render_widget(preview, chunks[1]);

        let help = Paragraph::new(format!(
            "Field {}/{} | Enter next | Esc back",
            index + 1,
            form.fields.len()
        ))
        .style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[2]);
    })?;
    Ok(())
}

fn draw_commands(terminal: &mut UiTerminal, form: &AddForm, error: Option<&str>) -> Result<()> {
    terminal.draw(|f| {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // Entered lines
                Constraint::Length(3), // Input
                Constraint::Length(1), // Help
            ])
            .split(size);

        let lines: Vec<Line> = form
            .manual_commands
            .iter()
            .map(|c| Line::from(format!("$ {}", c)))
            .collect();
        let entered = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Commands (run in order) "),
        );
        f.render_widget(entered, chunks[0]);

        let input = Paragraph::new(form.command_input.clone())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(" New command "));
        f.render_widget(input, chunks[1]);

        let help = error.map(str::to_string).unwrap_or_else(|| {
            "Enter add line | empty Enter finish | Backspace on empty removes last | Esc back"
                .to_string()
        });
        let style = if error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        f.render_widget(Paragraph::new(help).style(style), chunks[2]);
    })?;
    Ok(())
}

fn draw_preview(terminal: &mut UiTerminal, form: &AddForm, error: Option<&str>) -> Result<()> {
    terminal.draw(|f| {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Metadata
                Constraint::Min(5),    // Command block
                Constraint::Length(1), // Help
            ])
            .split(size);

        let meta = vec![
            Line::from(vec![
                Span::styled("name: ", Style::default().fg(Color::Cyan)),
                Span::raw(form.name()),
            ]),
            Line::from(vec![
                Span::styled("category: ", Style::default().fg(Color::Cyan)),
                Span::raw(form.category()),
            ]),
        ];
        let meta = Paragraph::new(meta)
            .block(Block::default().borders(Borders::ALL).title(" Snippet "));
        f.render_widget(meta, chunks[0]);

        let lines: Vec<Line> = form
            .commands()
            .into_iter()
            .map(|c| Line::from(format!("$ {}", c)))
            .collect();
        let block = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Commands (unfilled {variables} stay literal) "),
        );
        f.render_widget(block, chunks[1]);

        let help = error
            .map(str::to_string)
            .unwrap_or_else(|| "Enter save | Esc back".to_string());
        let style = if error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        f.render_widget(Paragraph::new(help).style(style), chunks[2]);
    })?;
    Ok(())
}
