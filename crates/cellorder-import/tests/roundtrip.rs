//! Integration tests for notebook import.
//!
//! Tests the full pipeline: nbformat v4 JSON -> event sequence -> replayed
//! state, checking that the state reconstructed from the emitted events
//! matches the source notebook.

use cellorder_core::events::Event;
use cellorder_core::materializer::reduce;
use cellorder_core::model::CellType;
use cellorder_core::tables::Tables;
use cellorder_import::{import, Notebook};

// =============================================================================
// Test Helpers
// =============================================================================

fn parse(json: &str) -> Notebook {
    serde_json::from_str(json).expect("valid nbformat v4 JSON")
}

fn replay(events: &[Event]) -> Tables {
    let mut tables = Tables::new();
    for event in events {
        tables.apply_all(reduce(event, &tables));
    }
    tables
}

fn small_notebook() -> &'static str {
    r##"{
        "cells": [
            {
                "cell_type": "markdown",
                "source": ["# Title\n", "Some intro text."],
                "outputs": []
            },
            {
                "cell_type": "code",
                "execution_count": 1,
                "source": "print('hello')",
                "outputs": [
                    {
                        "output_type": "stream",
                        "name": "stdout",
                        "text": "hello\n"
                    }
                ]
            },
            {
                "cell_type": "code",
                "execution_count": 2,
                "source": "1 + 1",
                "outputs": [
                    {
                        "output_type": "execute_result",
                        "execution_count": 2,
                        "data": {
                            "text/plain": "2"
                        }
                    }
                ]
            }
        ],
        "metadata": {
            "kernelspec": {
                "display_name": "Python 3",
                "language": "python"
            },
            "language_info": {
                "name": "python"
            }
        },
        "nbformat": 4,
        "nbformat_minor": 5
    }"##
}

// =============================================================================
// Basic Import Tests
// =============================================================================

#[test]
fn small_notebook_reconstructs_cell_order_and_content() {
    let notebook = parse(small_notebook());
    let events = import(&notebook, "2026-01-01").expect("import succeeds");
    let tables = replay(&events);

    let ordering = cellorder_core::query::cell_ordering(&tables);
    assert_eq!(ordering.len(), 3);

    let references = cellorder_core::query::cell_references(&tables);
    assert_eq!(references[0].2, CellType::Markdown);
    assert_eq!(references[1].2, CellType::Code);
    assert_eq!(references[2].2, CellType::Code);

    let markdown_cell = tables.cells.get(&references[0].0).unwrap();
    assert_eq!(markdown_cell.source, "# Title\nSome intro text.");

    let first_code_cell_id = &references[1].0;
    let outputs = cellorder_core::query::outputs_for_cell(&tables, first_code_cell_id);
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].stream_name.as_deref(), Some("stdout"));

    let second_code_cell_id = &references[2].0;
    let outputs = cellorder_core::query::outputs_for_cell(&tables, second_code_cell_id);
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].execution_count, Some(2));
}

#[test]
fn kernelspec_and_language_become_notebook_metadata() {
    let notebook = parse(small_notebook());
    let events = import(&notebook, "2026-01-01").expect("import succeeds");
    let tables = replay(&events);

    assert_eq!(
        tables.notebook_metadata.get("kernelspec_display_name"),
        Some(&serde_json::Value::String("Python 3".to_string()))
    );
    assert_eq!(
        tables.notebook_metadata.get("language"),
        Some(&serde_json::Value::String("python".to_string()))
    );
    assert_eq!(tables.notebook_title.as_deref(), Some("Imported Notebook - 2026-01-01"));
}

#[test]
fn raw_and_markdown_cells_carry_no_outputs() {
    let notebook = parse(
        r##"{
            "cells": [
                { "cell_type": "raw", "source": "plain text", "outputs": [] },
                { "cell_type": "markdown", "source": "# heading", "outputs": [] }
            ],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5
        }"##,
    );

    let events = import(&notebook, "2026-01-01").expect("import succeeds");
    assert!(!events.iter().any(|e| matches!(e, Event::CellOutputsCleared { .. })));

    let tables = replay(&events);
    for (id, _, cell_type) in cellorder_core::query::cell_references(&tables) {
        assert_eq!(cell_type, CellType::Markdown);
        assert!(cellorder_core::query::outputs_for_cell(&tables, &id).is_empty());
    }
}

#[test]
fn error_output_is_imported_with_traceback() {
    let notebook = parse(
        r#"{
            "cells": [
                {
                    "cell_type": "code",
                    "source": "1/0",
                    "outputs": [
                        {
                            "output_type": "error",
                            "ename": "ZeroDivisionError",
                            "evalue": "division by zero",
                            "traceback": ["line 1", "line 2"]
                        }
                    ]
                }
            ],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5
        }"#,
    );

    let events = import(&notebook, "2026-01-01").expect("import succeeds");
    let tables = replay(&events);
    let (cell_id, _, _) = &cellorder_core::query::cell_references(&tables)[0];
    let outputs = cellorder_core::query::outputs_for_cell(&tables, cell_id);
    assert_eq!(outputs.len(), 1);
    let data = outputs[0].data.as_ref().expect("error content has data");
    assert_eq!(data["ename"], "ZeroDivisionError");
}
