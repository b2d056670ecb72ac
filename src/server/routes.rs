use super::handlers;
use super::params::AnalysisQuery;
use super::AppState;
use std::convert::Infallible;
use warp::Filter;

pub fn routes(state: AppState) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let analysis = warp::path("analysis")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<AnalysisQuery>())
        .and(with_state(state))
        .and_then(handlers::handle_analysis);

    analysis.recover(handlers::handle_rejection)
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
