//! Converts an nbformat v4 [`Notebook`] into the event sequence that would
//! have produced it, by driving the same `createCellBetween` contract a
//! live client uses.

use cellorder_core::cellops::{create_cell_between, NewCellData};
use cellorder_core::events::{CellReference, Event};
use cellorder_core::materializer::reduce;
use cellorder_core::model::{ActorType, CellType, OutputContent, Representation};
use cellorder_core::tables::Tables;
use uuid::Uuid;

use crate::error::Result;
use crate::nbformat::{Notebook, NotebookOutput};

/// Raw cells have no outputs in Jupyter, so treating them as markdown for
/// `cellType` purposes loses nothing.
fn cell_type_of(nb_cell_type: &str) -> CellType {
    match nb_cell_type {
        "code" => CellType::Code,
        _ => CellType::Markdown,
    }
}

fn output_event(id: String, cell_id: &str, position: f64, output: &NotebookOutput) -> Event {
    match output {
        NotebookOutput::Stream { name, text } => Event::TerminalOutputAdded {
            id,
            cell_id: cell_id.to_string(),
            position,
            stream_name: name.clone(),
            content: OutputContent::inline(serde_json::Value::String(text.joined())),
        },
        NotebookOutput::ExecuteResult { execution_count, data } => {
            let representations = data
                .iter()
                .map(|(mime, value)| Representation {
                    mime_type: mime.clone(),
                    content: OutputContent::inline(value.clone()),
                })
                .collect();
            Event::MultimediaResultOutputAdded {
                id,
                cell_id: cell_id.to_string(),
                position,
                representations,
                execution_count: Some(execution_count.unwrap_or(0) as u32),
            }
        }
        NotebookOutput::DisplayData { data } => {
            let representations = data
                .iter()
                .map(|(mime, value)| Representation {
                    mime_type: mime.clone(),
                    content: OutputContent::inline(value.clone()),
                })
                .collect();
            Event::MultimediaDisplayOutputAdded {
                id,
                cell_id: cell_id.to_string(),
                position,
                display_id: None,
                representations,
                execution_count: None,
            }
        }
        NotebookOutput::Error { ename, evalue, traceback } => Event::ErrorOutputAdded {
            id,
            cell_id: cell_id.to_string(),
            position,
            content: OutputContent::inline(serde_json::json!({
                "ename": ename,
                "evalue": evalue,
                "traceback": traceback,
            })),
        },
    }
}

/// Import a parsed notebook, returning the event sequence a fresh state
/// would need to replay to reach the notebook's content.
///
/// `imported_at` is a caller-supplied, already-formatted date string
/// (the importer itself never reads the wall clock).
pub fn import(notebook: &Notebook, imported_at: &str) -> Result<Vec<Event>> {
    if notebook.nbformat != 4 {
        return Err(crate::error::ImportError::UnsupportedFormat(notebook.nbformat));
    }

    let mut events = Vec::new();
    let mut tables = Tables::new();
    let actor_id = Uuid::new_v4().to_string();

    let actor_event = Event::ActorProfileSet {
        id: actor_id.clone(),
        actor_type: ActorType::Human,
        display_name: "Notebook Importer".to_string(),
    };
    tables.apply_all(reduce(&actor_event, &tables));
    events.push(actor_event);

    let title_event = Event::NotebookTitleChanged {
        title: format!("Imported Notebook - {imported_at}"),
    };
    tables.apply_all(reduce(&title_event, &tables));
    events.push(title_event);

    if let Some(display_name) = notebook.metadata.kernelspec.as_ref().and_then(|k| k.display_name.clone()) {
        let event = Event::NotebookMetadataSet {
            key: "kernelspec_display_name".to_string(),
            value: serde_json::Value::String(display_name),
        };
        tables.apply_all(reduce(&event, &tables));
        events.push(event);
    }

    let language = notebook
        .metadata
        .language_info
        .as_ref()
        .and_then(|li| li.name.clone())
        .or_else(|| notebook.metadata.kernelspec.as_ref().and_then(|k| k.language.clone()));
    if let Some(language) = language {
        let event = Event::NotebookMetadataSet {
            key: "language".to_string(),
            value: serde_json::Value::String(language),
        };
        tables.apply_all(reduce(&event, &tables));
        events.push(event);
    }

    let mut cell_before: Option<CellReference> = None;

    for nb_cell in &notebook.cells {
        let cell_type = cell_type_of(&nb_cell.cell_type);
        let id = Uuid::new_v4().to_string();
        let all_cells: Vec<_> = tables.cells.values().cloned().collect();

        let create_result = create_cell_between(
            NewCellData {
                id: id.clone(),
                cell_type,
                created_by: actor_id.clone(),
            },
            cell_before.as_ref(),
            None,
            &all_cells,
            None,
            1,
        )?;

        for event in &create_result.events {
            tables.apply_all(reduce(event, &tables));
        }
        events.extend(create_result.events);

        let source_event = Event::CellSourceChanged {
            id: id.clone(),
            source: nb_cell.source.joined(),
            actor_id: Some(actor_id.clone()),
        };
        tables.apply_all(reduce(&source_event, &tables));
        events.push(source_event);

        if matches!(cell_type, CellType::Code) && !nb_cell.outputs.is_empty() {
            let clear_event = Event::CellOutputsCleared {
                cell_id: id.clone(),
                wait: false,
                cleared_by: Some(actor_id.clone()),
            };
            tables.apply_all(reduce(&clear_event, &tables));
            events.push(clear_event);

            for (position, output) in nb_cell.outputs.iter().enumerate() {
                let output_id = Uuid::new_v4().to_string();
                let event = output_event(output_id, &id, position as f64, output);
                tables.apply_all(reduce(&event, &tables));
                events.push(event);
            }
        }

        let new_index = tables
            .cells
            .get(&id)
            .and_then(|c| c.fractional_index.clone())
            .expect("cell just materialized by its own CellCreated event");
        cell_before = Some(CellReference {
            id,
            cell_type,
            fractional_index: new_index,
        });
    }

    Ok(events)
}
