//! Category assignment.
//!
//! Precedence is fixed: a print-edition record stays in the print group even
//! when it also has an in-network mirror.

use crate::models::{ArticleRecord, Category};

pub fn classify(record: &ArticleRecord) -> Category {
    category_for(record.is_print_edition, record.is_in_network)
}

pub fn category_for(is_print_edition: bool, is_in_network: bool) -> Category {
    if is_print_edition {
        Category::PrintEdition
    } else if is_in_network {
        Category::InNetwork
    } else {
        Category::ExternalDirect
    }
}
