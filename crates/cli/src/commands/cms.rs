//! CMS dataset maintenance commands.

#![allow(clippy::print_stdout)]

use super::cms_from_env;

/// Delete every product document from the CMS dataset.
pub async fn delete_all() -> Result<(), Box<dyn std::error::Error>> {
    let cms = cms_from_env()?;

    let docs = cms.fetch_products().await?;
    println!("Deleting {} product documents...", docs.len());

    cms.delete_all_products().await?;

    println!("Done");
    Ok(())
}
