use minesweeper_ai as ms;
use wasm_bindgen::prelude::*;

fn load(bts: &[u8]) -> Result<ms::KnowledgeBase, String> {
    ms::KnowledgeBase::deserialize(bts).map_err(|e| e.to_string())
}

fn store(ai: &ms::KnowledgeBase) -> Result<Vec<u8>, String> {
    ai.serialize().map_err(|e| e.to_string())
}

fn coords(cell: Option<ms::Cell>) -> Vec<u32> {
    cell.map(|c| vec![c.row as u32, c.col as u32])
        .unwrap_or_default()
}

#[wasm_bindgen]
pub fn create_engine(height: u32, width: u32) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let ai = ms::KnowledgeBase::new(height as usize, width as usize);
    store(&ai)
}

#[wasm_bindgen]
pub fn add_knowledge(bts: Vec<u8>, row: u32, col: u32, count: u32) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut ai = load(&bts)?;
    let cell = ms::Cell::new(row as usize, col as usize);
    ai.add_knowledge(cell, count as usize)
        .map_err(|e| e.to_string())?;
    store(&ai)
}

/// `[row, col]` of a known safe, unplayed cell, or an empty array.
#[wasm_bindgen]
pub fn safe_move(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    console_error_panic_hook::set_once();

    let ai = load(&bts)?;
    Ok(coords(ai.make_safe_move()))
}

/// `[row, col]` of a random cell that is neither played nor a known mine, or
/// an empty array.
#[wasm_bindgen]
pub fn random_move(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    console_error_panic_hook::set_once();

    let ai = load(&bts)?;
    Ok(coords(ai.make_random_move(&mut rand::rng())))
}

/// Known mines flattened as `[r0, c0, r1, c1, ...]`.
#[wasm_bindgen]
pub fn known_mines(bts: Vec<u8>) -> Result<Vec<u32>, String> {
    console_error_panic_hook::set_once();

    let ai = load(&bts)?;
    Ok(ai
        .mines()
        .iter()
        .flat_map(|c| [c.row as u32, c.col as u32])
        .collect())
}
