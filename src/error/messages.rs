use phf::phf_map;

static EN: phf::Map<&'static str, &'static str> = phf_map! {
    "invalid_address" => "Invalid Email Address",
    "invalid_mailbox" => "Invalid Mailbox",
    "local_size_short" => "Mailbox name too short",
    "local_size_long" => "Mailbox name too long",
    "domain_invalid" => "Invalid Domain Name",
    "incomplete_domain" => "Domain name is incomplete",
    "domain_unknown" => "Domain name not registered",
    "domain_does_not_accept_email" => "This domain is not configured to accept email",
    "domain_no_localhost" => "localhost is not allowed for your domain name",
    "dns_unavailable" => "Unable to verify the domain name at this time",
    "ip_address_forbidden" => "IP Addresses are not allowed",
    "ip_address_no_localhost" => "Localhost IP addresses are not allowed",
    "ipv4_address_invalid" => "This is not a valid IPv4 address",
    "ipv6_address_invalid" => "This is not a valid IPv6 address",
    "exceeds_size" => "Address too long",
    "not_allowed" => "Address is not allowed",
    "server_not_available" => "The remote email server is not available",
    "address_unknown" => "Address is not accepted by the email provider",
    "srs_altered" => "Invalid SRS Email Address: Possibly altered",
    "srs_expired" => "Invalid SRS Email Address: Too old",
};

static FR: phf::Map<&'static str, &'static str> = phf_map! {
    "invalid_address" => "Adresse e-mail invalide",
    "invalid_mailbox" => "Boîte aux lettres invalide",
    "local_size_short" => "Nom de boîte aux lettres trop court",
    "local_size_long" => "Nom de boîte aux lettres trop long",
    "domain_invalid" => "Nom de domaine invalide",
    "incomplete_domain" => "Nom de domaine incomplet",
    "domain_unknown" => "Nom de domaine non enregistré",
    "domain_does_not_accept_email" => "Ce domaine n'est pas configuré pour recevoir des e-mails",
    "domain_no_localhost" => "localhost n'est pas autorisé comme nom de domaine",
    "dns_unavailable" => "Impossible de vérifier le nom de domaine pour le moment",
    "ip_address_forbidden" => "Les adresses IP ne sont pas autorisées",
    "ip_address_no_localhost" => "Les adresses IP locales ne sont pas autorisées",
    "ipv4_address_invalid" => "Adresse IPv4 invalide",
    "ipv6_address_invalid" => "Adresse IPv6 invalide",
    "exceeds_size" => "Adresse trop longue",
    "not_allowed" => "Adresse non autorisée",
    "server_not_available" => "Le serveur de messagerie distant est indisponible",
    "address_unknown" => "Adresse refusée par le fournisseur",
    "srs_altered" => "Adresse SRS invalide : possiblement altérée",
    "srs_expired" => "Adresse SRS invalide : trop ancienne",
};

fn catalog(locale: &str) -> Option<&'static phf::Map<&'static str, &'static str>> {
    // "en-US" / "fr_CA" resolve to their language catalog
    let lang = locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_ascii_lowercase();
    match lang.as_str() {
        "en" => Some(&EN),
        "fr" => Some(&FR),
        _ => None,
    }
}

/// Localized text for an error symbol; falls back to the symbol itself.
pub fn message_for(kind: &str, locale: &str) -> String {
    catalog(locale)
        .and_then(|messages| messages.get(kind))
        .map(|text| (*text).to_string())
        .unwrap_or_else(|| kind.to_string())
}
