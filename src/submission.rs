//! Turns a request file into a workflow request ready to run.

use vetrec_core::{LegalTextCatalogue, SessionIdentity, SignatureArtifact, WorkflowRequest};

/// Fills what the request file may leave to the caller.
///
/// - A blank signer name is taken from the signed-in session.
/// - A blank legal text version is taken from the catalogue, when one was fetched.
/// - A signature read from a separate file replaces the one in the request.
///
/// A version that differs from the catalogue's is kept as given and logged; the server
/// decides whether it is still acceptable.
pub fn prepare_request(
    mut request: WorkflowRequest,
    identity: &SessionIdentity,
    catalogue: Option<&LegalTextCatalogue>,
    signature: Option<SignatureArtifact>,
) -> WorkflowRequest {
    let consent = &mut request.consent_payload;

    if consent.signer_name.trim().is_empty() {
        consent.signer_name = identity.name.to_string();
    }

    if let Some(signature) = signature {
        consent.signature = Some(signature);
    }

    if let Some(catalogue) = catalogue {
        let kind = consent.consent_kind;
        match catalogue.version_for(kind) {
            Some(current) if consent.legal_text_version.trim().is_empty() => {
                consent.legal_text_version = current.to_string();
            }
            Some(current) if consent.legal_text_version.trim() != current => {
                tracing::warn!(
                    consent_kind = %kind,
                    requested = %consent.legal_text_version,
                    current,
                    "legal text version is not the current one"
                );
            }
            Some(_) => {}
            None => tracing::warn!(consent_kind = %kind, "no legal text published for consent kind"),
        }
    }

    request
}
