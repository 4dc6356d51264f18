//! External collaborator services: generative image analysis and
//! weather lookups. Both sit behind capability traits so the ingestion
//! pipeline and routes never depend on the concrete HTTP clients.

pub mod analysis;
pub mod weather;
