use greenlord_core::error::GrantError;
use greenlord_core::model::Postcode;
use greenlord_core::postcode::AuthorityLookup;

use crate::config::CliConfig;

pub fn run(config: &CliConfig, raw: &str) -> Result<(), GrantError> {
    let postcode = Postcode::parse(raw)?;
    let engine = super::engine(config)?;
    let lookup = engine.lookup();

    println!("Postcode: {postcode}");
    println!("  District: {}", postcode.outward());

    let Some(la) = lookup.local_authority(&postcode) else {
        match lookup.region(&postcode) {
            Some(region) => println!("  Region:   {region}"),
            None => println!("  Region:   not recognised"),
        }
        println!("  Local authority not recognised; local schemes will need confirming.");
        return Ok(());
    };

    println!("  Region:   {}", la.region);
    println!("  Council:  {} ({})", la.name, la.id);
    println!("  Website:  {}", la.website_url);
    println!("  Email:    {}", la.contact_email);
    println!("  Phone:    {}", la.contact_phone);

    let local = engine.catalog().for_local_authority(&la.id);
    if !local.is_empty() {
        println!("\nLocal schemes:");
        for scheme in local {
            println!("  {} (up to {})", scheme.name, scheme.max_grant_value);
        }
    }
    Ok(())
}
