//! Verbose, consense-style report of the supported splits.
//!
//! The layout mimics the PHYLIP `consense` output so existing tooling that
//! scrapes it keeps working: a list of species, one line per split with an
//! asterisk/dot mask over the taxa and the support in percent, and finally
//! the annotated Newick tree.

use std::io::{self, Write};

use crate::newick::write_newick;
use crate::splits::supported_splits;
use crate::tree::TreeArena;

/// Write the full report for an annotated tree.
pub fn write_report<W: Write>(out: &mut W, tree: &TreeArena, names: &[String]) -> io::Result<()> {
    writeln!(out, "\nConsensus tree program, version 3.695\n")?;

    writeln!(out, "Species in order:\n")?;
    for (k, name) in names.iter().enumerate() {
        writeln!(out, "  {}. {}", k + 1, name)?;
    }

    writeln!(out, "\n\n\nSets included in the consensus tree\n")?;
    writeln!(out, "Set (species in order)     How many times out of  100.00\n")?;

    for split in supported_splits(tree) {
        writeln!(
            out,
            "{}                     {:.1}",
            split.members.to_mask(names.len()),
            split.support * 100.0
        )?;
    }

    writeln!(out, "\n\nSets NOT included in consensus tree: NONE.\n")?;
    write_newick(out, tree, names)
}
