//! SparseFract demo exerciser
//!
//! Loops the multiply engine over a seed value and two half-magnitude
//! factors, printing every intermediate in the diagnostic layout, then walks
//! through the add/sub/shift surface on a couple of hand-picked values.

use sparsefract::{Result, SparseFraction};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    println!("=== SparseFract Demo ===\n");

    multiply_chain()?;
    add_sub_walkthrough()?;
    shift_walkthrough()?;

    Ok(())
}

/// Alternate multiplying by -1/2 and +1/2, watching the dense bits drain
/// into the sparse term.
fn multiply_chain() -> Result<()> {
    println!("--- multiply chain ---");
    let mut a = SparseFraction::from_parts(true, 0x8888_0000_0000_0000, false, 0, 0)?;
    let b = SparseFraction::from_parts(true, 0x8000_0000_0000_0000, false, 0, 0)?;
    let c = SparseFraction::from_parts(false, 0x8000_0000_0000_0000, false, 0, 0)?;

    println!("seed: {a} (~{:+.6})", a.to_f64());
    for round in 0..40 {
        a.mul_assign(&b)?;
        println!("round {round:2}: *b -> {a}");
        a.mul_assign(&c)?;
        println!("round {round:2}: *c -> {a}");
    }
    println!();
    Ok(())
}

fn add_sub_walkthrough() -> Result<()> {
    println!("--- add / sub ---");
    let half = SparseFraction::from_f64(0.5)?;
    let quarter = SparseFraction::from_f64(0.25)?;

    let sum = half.add(quarter)?;
    println!("0.5 + 0.25  = {sum} (~{:+.6})", sum.to_f64());

    let diff = quarter.sub(half)?;
    println!("0.25 - 0.5  = {diff} (~{:+.6})", diff.to_f64());

    let product = half.mul(quarter)?;
    println!("0.5 * 0.25  = {product} (~{:+.6})", product.to_f64());

    let cancelled = sum.add(sum.neg())?;
    println!("x + (-x)    = {cancelled}");

    let three_quarters = SparseFraction::from_f64(0.75)?;
    match three_quarters.add(half) {
        Ok(v) => println!("0.75 + 0.5  = {v}"),
        Err(err) => println!("0.75 + 0.5  -> {err}"),
    }
    println!();
    Ok(())
}

fn shift_walkthrough() -> Result<()> {
    println!("--- shift ---");
    let mut v = SparseFraction::from_f64(0.0625)?;
    println!("start:      {v} (~{:+.6})", v.to_f64());
    v.shl_assign(3)?;
    println!("<< 3:       {v} (~{:+.6})", v.to_f64());
    match v.shl(1) {
        Ok(v) => println!("<< 1:       {v}"),
        Err(err) => println!("<< 1:       -> {err}"),
    }
    println!();
    Ok(())
}
